//! Property-based invariant tests for cells and store batching.
//!
//! 1. Version equals the number of writes that changed the value.
//! 2. Outside a batch every changing write notifies exactly once.
//! 3. A batch notifies each changed cell exactly once, with its final value.
//! 4. Equal writes never notify.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;
use reactree_core::{Observable, Store, Subscription};

const CELLS: usize = 4;

#[derive(Debug, Clone)]
enum Step {
    Write { cell: usize, value: u8 },
    Batch(Vec<(usize, u8)>),
}

fn step_strategy() -> impl Strategy<Value = Step> {
    let write = (0..CELLS, 0u8..4);
    prop_oneof![
        write.clone().prop_map(|(cell, value)| Step::Write { cell, value }),
        proptest::collection::vec(write, 0..8).prop_map(Step::Batch),
    ]
}

struct Harness {
    store: Store,
    cells: Vec<Observable<u8>>,
    log: Rc<RefCell<Vec<(usize, u8)>>>,
    _subs: Vec<Subscription>,
}

impl Harness {
    fn new() -> Self {
        let store = Store::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let cells: Vec<Observable<u8>> = (0..CELLS).map(|_| store.cell(0)).collect();
        let subs = cells
            .iter()
            .enumerate()
            .map(|(idx, cell)| {
                let log = Rc::clone(&log);
                cell.subscribe(move |v| log.borrow_mut().push((idx, *v)))
            })
            .collect();
        Self {
            store,
            cells,
            log,
            _subs: subs,
        }
    }
}

proptest! {
    #[test]
    fn notifications_match_changes(steps in proptest::collection::vec(step_strategy(), 0..24)) {
        let h = Harness::new();
        let mut model = [0u8; CELLS];
        let mut versions = [0u64; CELLS];

        for step in steps {
            h.log.borrow_mut().clear();
            match step {
                Step::Write { cell, value } => {
                    let changed = model[cell] != value;
                    prop_assert_eq!(h.cells[cell].set(value), changed);
                    if changed {
                        model[cell] = value;
                        versions[cell] += 1;
                        prop_assert_eq!(h.log.borrow().clone(), vec![(cell, value)]);
                    } else {
                        prop_assert!(h.log.borrow().is_empty());
                    }
                }
                Step::Batch(writes) => {
                    let mut touched: Vec<usize> = Vec::new();
                    h.store.batch(|| {
                        for (cell, value) in &writes {
                            if model[*cell] != *value {
                                model[*cell] = *value;
                                versions[*cell] += 1;
                                if !touched.contains(cell) {
                                    touched.push(*cell);
                                }
                            }
                            h.cells[*cell].set(*value);
                        }
                    });
                    let expected: Vec<(usize, u8)> =
                        touched.iter().map(|&cell| (cell, model[cell])).collect();
                    prop_assert_eq!(h.log.borrow().clone(), expected);
                }
            }
            for (idx, cell) in h.cells.iter().enumerate() {
                prop_assert_eq!(cell.get(), model[idx]);
                prop_assert_eq!(cell.version(), versions[idx]);
            }
        }
    }
}
