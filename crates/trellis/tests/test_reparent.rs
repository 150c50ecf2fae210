//! Integration tests for reparenting and container operations.

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use pretty_assertions::assert_eq;
    use trellis::{
        ChildMessage, Context, CustomMessage, Message, WidgetId,
        error::{Error, Result},
        testing::harness::Harness,
        widget::Widget,
    };

    /// Records the payload of every child message delivered to a widget.
    fn capture_child_messages(
        h: &mut Harness,
        id: WidgetId,
    ) -> Result<Rc<RefCell<Vec<(String, ChildMessage)>>>> {
        let seen: Rc<RefCell<Vec<(String, ChildMessage)>>> = Rc::default();
        let sink = Rc::clone(&seen);
        h.core.install_message_hook(id, move |_: WidgetId, msg: &Message| {
            if let Some(child) = msg.child() {
                sink.borrow_mut().push((msg.name().to_string(), *child));
            }
            true
        })?;
        Ok(seen)
    }

    #[test]
    fn cycle_rejection_leaves_tree_unchanged() -> Result<()> {
        let mut h = Harness::new();
        let a = h.probe("a");
        let (b, kids) = h.tree("b", &["c"])?;
        h.core.add_child(a, b)?;
        let c = kids[0];
        h.log.clear();

        assert_eq!(
            h.core.set_parent(a, Some(c)),
            Err(Error::WouldCreateCycle { parent: c, child: a })
        );
        assert_eq!(
            h.core.add_child(b, b),
            Err(Error::WouldCreateCycle { parent: b, child: b })
        );
        assert_eq!(h.core.parent(a), None);
        assert_eq!(h.core.parent(b), Some(a));
        assert_eq!(h.core.children(b), &[c]);
        assert!(h.log.is_empty());
        h.core.check_invariants()
    }

    #[test]
    fn child_messages_carry_indices() -> Result<()> {
        let mut h = Harness::new();
        let (p, kids) = h.tree("p", &["a", "b", "c"])?;
        let q = h.probe("q");
        let from_p = capture_child_messages(&mut h, p)?;
        let from_q = capture_child_messages(&mut h, q)?;

        h.core.insert_child(q, 42, kids[1])?;
        h.core.move_child(p, 1, 0)?;

        assert_eq!(
            *from_p.borrow(),
            vec![
                (
                    "child-removed".to_string(),
                    ChildMessage::with_indices(kids[1], Some(1), None)
                ),
                (
                    "child-moved".to_string(),
                    ChildMessage::with_indices(kids[2], Some(1), Some(0))
                ),
            ]
        );
        assert_eq!(
            *from_q.borrow(),
            vec![(
                "child-added".to_string(),
                ChildMessage::with_indices(kids[1], None, Some(0))
            )]
        );
        assert_eq!(h.core.children(p), &[kids[2], kids[0]]);
        Ok(())
    }

    #[test]
    fn move_between_attached_parents() -> Result<()> {
        let mut h = Harness::new();
        let root = h.probe("root");
        let (p1, kids) = h.tree("p1", &["c"])?;
        let p2 = h.probe("p2");
        h.core.add_child(root, p1)?;
        h.core.add_child(root, p2)?;
        h.attach(root)?;
        let c = kids[0];
        h.log.clear();

        h.core.set_parent(c, Some(p2))?;
        assert_eq!(
            h.names(c),
            vec!["before-detach", "after-attach", "parent-changed"]
        );
        assert!(h.core.is_visible(c));
        let p2_el = h.core.element(p2).unwrap();
        let c_el = h.core.element(c).unwrap();
        assert_eq!(h.core.document().element(c_el).unwrap().parent(), Some(p2_el));
        h.core.check_invariants()
    }

    #[test]
    fn move_to_unattached_parent_detaches() -> Result<()> {
        let mut h = Harness::new();
        let (root, kids) = h.tree("root", &["c"])?;
        let loose = h.probe("loose");
        h.attach(root)?;
        let c = kids[0];

        h.core.set_parent(c, Some(loose))?;
        assert!(!h.core.is_attached(c));
        assert_eq!(h.core.parent(c), Some(loose));
        h.core.check_invariants()
    }

    #[test]
    fn moving_within_parent_keeps_attachment() -> Result<()> {
        let mut h = Harness::new();
        let (root, kids) = h.tree("root", &["a", "b"])?;
        h.attach(root)?;
        h.log.clear();

        h.core.insert_child(root, 0, kids[1])?;
        assert_eq!(h.names(root), vec!["child-moved"]);
        assert!(h.names(kids[1]).is_empty());
        assert!(h.core.is_visible(kids[1]));

        let root_el = h.core.element(root).unwrap();
        let expected: Vec<_> = [kids[1], kids[0]]
            .iter()
            .filter_map(|id| h.core.element(*id))
            .collect();
        assert_eq!(
            h.core.document().element(root_el).unwrap().children(),
            expected.as_slice()
        );
        h.core.check_invariants()
    }

    #[test]
    fn unparenting_a_detached_child_is_quiet() -> Result<()> {
        let mut h = Harness::new();
        let (p, kids) = h.tree("p", &["c"])?;
        h.log.clear();
        h.core.set_parent(kids[0], None)?;
        assert_eq!(h.names(p), vec!["child-removed"]);
        assert_eq!(h.names(kids[0]), vec!["parent-changed"]);
        let el = h.core.element(kids[0]).unwrap();
        assert_eq!(h.core.document().element(el).unwrap().parent(), None);
        Ok(())
    }

    #[test]
    fn hooks_can_build_children() -> Result<()> {
        /// Adds a child the first time it is attached.
        struct Builder {
            built: Option<WidgetId>,
        }

        impl Widget for Builder {
            fn on_after_attach(&mut self, ctx: &mut dyn Context) -> Result<()> {
                if self.built.is_none() {
                    let child = ctx.add(Box::new(Leaf));
                    ctx.add_child(ctx.node_id(), child)?;
                    self.built = Some(child);
                }
                Ok(())
            }
        }

        /// An empty widget.
        struct Leaf;

        impl Widget for Leaf {}

        let mut h = Harness::new();
        let id = h.core.add(Builder { built: None }).id();
        h.attach(id)?;

        let child = h.core.widget::<Builder>(id).and_then(|b| b.built).unwrap();
        assert_eq!(h.core.children(id), &[child]);
        assert!(h.core.is_attached(child));
        assert!(h.core.is_visible(child));
        h.core.check_invariants()
    }

    #[test]
    fn child_added_from_hook_is_attached_once() -> Result<()> {
        /// Adopts a prepared child when attached.
        struct Adopter {
            child: WidgetId,
        }

        impl Widget for Adopter {
            fn on_after_attach(&mut self, ctx: &mut dyn Context) -> Result<()> {
                ctx.add_child(ctx.node_id(), self.child)
            }
        }

        let mut h = Harness::new();
        let child = h.probe("child");
        h.core.install_message_hook(child, h.log.hook())?;
        let id = h.core.add(Adopter { child }).id();
        h.attach(id)?;

        assert!(h.core.is_attached(child));
        // Once through the hook, once through the widget itself.
        assert_eq!(h.log.count(child, "after-attach"), 2);
        h.core.check_invariants()
    }

    #[test]
    fn hooks_can_rearrange_children() -> Result<()> {
        /// Rotates its children on `rotate` and drops its first child on `pop`.
        struct Shuffler;

        impl Widget for Shuffler {
            fn on_message(&mut self, ctx: &mut dyn Context, msg: &CustomMessage) -> Result<()> {
                let me = ctx.node_id();
                match &*msg.name {
                    "rotate" => ctx.move_child(me, 0, usize::MAX),
                    "pop" => ctx.remove_child_at(me, 0).map(|_| ()),
                    _ => Ok(()),
                }
            }
        }

        let mut h = Harness::new();
        let p = h.core.add(Shuffler).id();
        let a = h.probe("a");
        let b = h.probe("b");
        h.core.add_child(p, a)?;
        h.core.add_child(p, b)?;
        h.attach(p)?;

        h.core.send(p, &Message::custom("rotate"));
        assert_eq!(h.core.children(p), &[b, a]);
        h.core.send(p, &Message::custom("pop"));
        assert_eq!(h.core.children(p), &[a]);
        assert!(!h.core.is_attached(b));
        assert_eq!(h.error_count(), 0);
        h.core.check_invariants()
    }
}
