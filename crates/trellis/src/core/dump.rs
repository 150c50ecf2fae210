use std::io::{self, Write};

use termcolor::{Buffer, Color, ColorSpec, WriteColor};

use crate::{
    WidgetId,
    core::{node::Node, world::Core},
    error::{Error, Result},
};

/// Traverses a widget subtree and returns a string showing each widget's
/// name, lifecycle state and geometry. This is a debug function.
pub fn dump(core: &Core, root: WidgetId) -> Result<String> {
    let mut buffer = Buffer::ansi();
    dump_node(&mut buffer, core, root, 0)?;
    Ok(String::from_utf8_lossy(buffer.as_slice()).into_owned())
}

/// Convert a buffer write failure.
fn io_error(e: io::Error) -> Error {
    Error::Internal(format!("dump: {e}"))
}

/// Helper to write an indented, colored label followed by a value.
fn write_field(buffer: &mut Buffer, indent: &str, label: &str, value: &str) -> io::Result<()> {
    write!(buffer, "{indent}  ")?;
    buffer.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    write!(buffer, "{label}")?;
    buffer.reset()?;
    writeln!(buffer, " {value}")
}

/// Write the lines for a single widget.
fn write_node(buffer: &mut Buffer, id: WidgetId, node: &Node, indent: &str) -> io::Result<()> {
    write!(buffer, "{indent}")?;
    buffer.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
    write!(buffer, "{}", node.name())?;
    buffer.reset()?;
    write!(buffer, " {id:?} ")?;

    let color = if node.state().is_visible() {
        Color::White
    } else {
        Color::Yellow
    };
    buffer.set_color(ColorSpec::new().set_fg(Some(color)))?;
    write!(buffer, "{:?}", node.state())?;
    if node.hidden() {
        write!(buffer, ", hidden")?;
    }
    buffer.reset()?;
    writeln!(buffer)?;

    if let Some(rect) = node.geometry() {
        write_field(
            buffer,
            indent,
            "geometry:",
            &format!("x: {}, y: {}, w: {}, h: {}", rect.x, rect.y, rect.w, rect.h),
        )?;
    }
    if node.has_layout() {
        write_field(buffer, indent, "layout:", "yes")?;
    }
    Ok(())
}

/// Walk a widget subtree and emit formatted debug output.
fn dump_node(buffer: &mut Buffer, core: &Core, id: WidgetId, level: usize) -> Result<()> {
    let node = core.node(id).ok_or(Error::Disposed(id))?;
    let indent = "    ".repeat(level);
    write_node(buffer, id, node, &indent).map_err(io_error)?;
    for child in node.children() {
        dump_node(buffer, core, *child, level + 1)?;
    }
    Ok(())
}
