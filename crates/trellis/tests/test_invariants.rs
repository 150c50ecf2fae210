//! Randomized checks that tree invariants survive arbitrary operation
//! sequences, and that failed operations leave the tree untouched.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use trellis::{Core, LifeState, Message, WidgetId, error::Result, testing::harness::Harness};

    /// Number of widgets in each generated tree.
    const POOL: usize = 6;

    /// A single structural operation on widgets picked from the pool.
    #[derive(Debug, Clone)]
    enum Op {
        Attach(usize),
        Detach(usize),
        SetParent(usize, Option<usize>),
        Insert(usize, usize, usize),
        Move(usize, usize, usize),
        RemoveAt(usize, usize),
        Hide(usize),
        Show(usize),
        Dispose(usize),
        Close(usize),
        Update(usize),
        Flush,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        let w = 0..POOL;
        prop_oneof![
            w.clone().prop_map(Op::Attach),
            w.clone().prop_map(Op::Detach),
            (w.clone(), proptest::option::of(0..POOL)).prop_map(|(a, b)| Op::SetParent(a, b)),
            (w.clone(), w.clone(), 0usize..4).prop_map(|(p, c, i)| Op::Insert(p, c, i)),
            (w.clone(), 0usize..4, 0usize..4).prop_map(|(p, a, b)| Op::Move(p, a, b)),
            (w.clone(), 0usize..4).prop_map(|(p, i)| Op::RemoveAt(p, i)),
            w.clone().prop_map(Op::Hide),
            w.clone().prop_map(Op::Show),
            w.clone().prop_map(Op::Dispose),
            w.clone().prop_map(Op::Close),
            w.prop_map(Op::Update),
            Just(Op::Flush),
        ]
    }

    /// Per-widget structural state used to detect partial mutation.
    type Snapshot = Vec<(Option<WidgetId>, Vec<WidgetId>, LifeState, bool)>;

    fn snapshot(core: &Core, ids: &[WidgetId]) -> Snapshot {
        ids.iter()
            .map(|id| {
                (
                    core.parent(*id),
                    core.children(*id).to_vec(),
                    core.state(*id),
                    core.is_hidden(*id),
                )
            })
            .collect()
    }

    /// Apply an operation. `Some(result)` for fallible operations.
    fn apply(h: &mut Harness, ids: &[WidgetId], op: &Op) -> Option<Result<()>> {
        let core = &mut h.core;
        match *op {
            Op::Attach(i) => Some(core.attach(ids[i], h.host)),
            Op::Detach(i) => Some(core.detach(ids[i])),
            Op::SetParent(c, p) => Some(core.set_parent(ids[c], p.map(|p| ids[p]))),
            Op::Insert(p, c, i) => Some(core.insert_child(ids[p], i, ids[c])),
            Op::Move(p, a, b) => Some(core.move_child(ids[p], a, b)),
            Op::RemoveAt(p, i) => Some(core.remove_child_at(ids[p], i).map(|_| ())),
            Op::Hide(i) => Some(core.hide(ids[i]).map(|_| ())),
            Op::Show(i) => Some(core.show(ids[i]).map(|_| ())),
            Op::Dispose(i) => {
                core.dispose(ids[i]);
                None
            }
            Op::Close(i) => {
                core.close(ids[i]);
                None
            }
            Op::Update(i) => {
                core.post(ids[i], Message::UpdateRequest);
                None
            }
            Op::Flush => {
                core.flush();
                None
            }
        }
    }

    /// The visibility rule, checked directly against public queries.
    fn visibility_holds(core: &Core, id: WidgetId) -> bool {
        let expected = core.is_attached(id)
            && !core.is_hidden(id)
            && core.parent(id).is_none_or(|p| core.is_visible(p));
        core.is_visible(id) == expected
    }

    proptest! {
        #[test]
        fn invariants_hold_after_every_operation(
            ops in proptest::collection::vec(op_strategy(), 1..40)
        ) {
            let mut h = Harness::new();
            let ids: Vec<WidgetId> = (0..POOL).map(|i| h.probe(&format!("w{i}"))).collect();

            for op in &ops {
                let before = snapshot(&h.core, &ids);
                let result = apply(&mut h, &ids, op);
                if let Some(Err(e)) = result {
                    prop_assert_eq!(
                        snapshot(&h.core, &ids),
                        before,
                        "{:?} failed with {} but changed the tree",
                        op,
                        e
                    );
                }
                if let Err(e) = h.core.check_invariants() {
                    prop_assert!(false, "after {:?}: {}", op, e);
                }
                for id in &ids {
                    prop_assert!(visibility_holds(&h.core, *id), "visibility of {:?}", id);
                    if h.core.is_disposed(*id) {
                        prop_assert!(h.core.node(*id).is_none());
                    }
                }
            }
            prop_assert_eq!(h.error_count(), 0);
        }

        #[test]
        fn attach_detach_round_trip(hidden in proptest::collection::vec(any::<bool>(), POOL)) {
            let mut h = Harness::new();
            let ids: Vec<WidgetId> = (0..POOL).map(|i| h.probe(&format!("w{i}"))).collect();
            // A chain: w0 -> w1 -> ... -> w5.
            for pair in ids.windows(2) {
                h.core.add_child(pair[0], pair[1]).unwrap();
            }
            for (id, hide) in ids.iter().zip(&hidden) {
                h.core.set_hidden(*id, *hide).unwrap();
            }

            h.attach(ids[0]).unwrap();
            let mut visible = true;
            for (id, hide) in ids.iter().zip(&hidden) {
                visible = visible && !hide;
                prop_assert!(h.core.is_attached(*id));
                prop_assert_eq!(h.core.is_visible(*id), visible);
            }

            h.core.detach(ids[0]).unwrap();
            for id in &ids {
                prop_assert!(!h.core.is_attached(*id));
                prop_assert_eq!(h.log.count(*id, "after-attach"), 1);
                prop_assert_eq!(h.log.count(*id, "before-detach"), 1);
            }
            prop_assert!(h.core.document().element(h.host).unwrap().children().is_empty());
        }
    }
}
