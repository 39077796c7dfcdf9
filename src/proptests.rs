use super::*;

use proptest::prelude::*;
use std::collections::BTreeMap;

/// Reference model: a plain map of rules, resolved by brute force.
#[derive(Clone, Default)]
struct Model {
    rules: BTreeMap<String, String>,
}

impl Model {
    fn add(&mut self, from: &str, to: &str) -> bool {
        if !symbol::are_suitable_for_rewrite(from, to) {
            return false;
        }
        self.rules.insert(from.to_string(), to.to_string());
        true
    }

    fn remove(&mut self, prefix: &str) -> usize {
        if !symbol::is_number(prefix) {
            return 0;
        }
        let before = self.rules.len();
        self.rules.retain(|from, _| !from.starts_with(prefix));
        before - self.rules.len()
    }

    fn get(&self, number: &str) -> Vec<String> {
        if !symbol::is_number(number) {
            return Vec::new();
        }
        let best = self
            .rules
            .iter()
            .filter(|(from, _)| number.starts_with(from.as_str()))
            .max_by_key(|(from, _)| from.len());
        match best {
            Some((from, to)) => vec![format!("{to}{}", &number[from.len()..])],
            None => vec![number.to_string()],
        }
    }

    fn reverse(&self, number: &str) -> Vec<String> {
        if !symbol::is_number(number) {
            return Vec::new();
        }
        let mut out: Vec<String> = self
            .rules
            .iter()
            .filter(|(_, to)| number.starts_with(to.as_str()))
            .map(|(from, to)| format!("{from}{}", &number[to.len()..]))
            .collect();
        out.push(number.to_string());
        out.sort_by(|a, b| symbol::compare(a, b));
        out.dedup();
        out
    }
}

#[derive(Clone, Debug)]
enum Op {
    Add(String, String),
    Remove(String),
    Get(String),
    Reverse(String),
}

fn number_strategy() -> impl Strategy<Value = String> + Clone {
    // A small alphabet and short numbers, so rules overlap often.
    prop_oneof![
        20 => "[0-2*#]{1,4}",
        1 => "[0-2a]{0,3}",
    ]
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let n = number_strategy();
    let op = prop_oneof![
        45 => (n.clone(), n.clone()).prop_map(|(a, b)| Op::Add(a, b)),
        15 => n.clone().prop_map(Op::Remove),
        20 => n.clone().prop_map(Op::Get),
        20 => n.clone().prop_map(Op::Reverse),
    ];
    prop::collection::vec(op, 0..=300)
}

fn assert_sorted_unique(list: &NumberList) {
    for pair in list.as_slice().windows(2) {
        assert_eq!(
            symbol::compare(&pair[0], &pair[1]),
            std::cmp::Ordering::Less,
            "reverse output out of order or duplicated: {list:?}"
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in ops_strategy()) {
        let mut t = ForwardingTable::new();
        let mut m = Model::default();

        for op in ops {
            match op {
                Op::Add(from, to) => {
                    let ok_t = t.add(&from, &to).is_ok();
                    let ok_m = m.add(&from, &to);
                    prop_assert_eq!(ok_t, ok_m);
                }
                Op::Remove(prefix) => {
                    prop_assert_eq!(t.remove(&prefix), m.remove(&prefix));
                }
                Op::Get(number) => {
                    let got = t.get(&number).unwrap().into_vec();
                    prop_assert_eq!(got, m.get(&number));
                }
                Op::Reverse(number) => {
                    let got = t.reverse(&number).unwrap();
                    assert_sorted_unique(&got);
                    prop_assert_eq!(got.into_vec(), m.reverse(&number));
                }
            }

            prop_assert_eq!(t.len(), m.rules.len());
        }

        t.validate();
        let got: Vec<(String, String)> = t.rules().map(|(k, v)| (k, v.to_string())).collect();
        let mut expected: Vec<(String, String)> =
            m.rules.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        expected.sort_by(|a, b| symbol::compare(&a.0, &b.0));
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_add_remove_round_trip(
        setup in prop::collection::vec((number_strategy(), number_strategy()), 0..20),
        from in "[0-2*#]{1,4}",
        to in "[0-2*#]{1,4}",
        probe in "[0-2*#]{0,3}",
    ) {
        let mut t = ForwardingTable::new();
        for (a, b) in &setup {
            // Keep `from` and everything under it out of the setup.
            if !a.starts_with(from.as_str()) {
                let _ = t.add(a, b);
            }
        }
        prop_assume!(from != to);

        let probe = format!("{to}{probe}");
        let before = t.reverse(&probe).unwrap();
        let get_before = t.get(&from).unwrap();
        let snapshot = t.snapshot();

        t.add(&from, &to).unwrap();
        t.remove(&from);

        prop_assert_eq!(t.get(&from).unwrap(), get_before);
        prop_assert_eq!(t.reverse(&probe).unwrap(), before);
        prop_assert_eq!(t.snapshot(), snapshot);
        t.validate();
    }
}

#[test]
fn round_trip_under_shorter_rule() {
    let mut t = ForwardingTable::new();
    t.add("*", "#").unwrap();
    let get_before = t.get("*#").unwrap();
    let reverse_before = t.reverse("#1").unwrap();
    let snapshot = t.snapshot();

    t.add("*#", "#").unwrap();
    assert_eq!(t.remove("*#"), 1);

    // Still resolved through the shorter rule.
    assert_eq!(t.get("*#").unwrap(), get_before);
    assert_eq!(get_before.first(), Some("##"));
    assert_eq!(t.reverse("#1").unwrap(), reverse_before);
    assert_eq!(t.snapshot(), snapshot);
    t.validate();
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

const SMALL_RULES: [(&str, &str); 6] = [
    ("1", "2"),
    ("12", "3"),
    ("123", "2"),
    ("2", "12"),
    ("*", "1#"),
    ("13", "2"),
];

#[test]
fn exhaustive_add_order_small_set() {
    let mut reference = ForwardingTable::new();
    for (from, to) in SMALL_RULES {
        reference.add(from, to).unwrap();
    }
    let expected: Vec<(String, String)> = reference.rules().map(|(k, v)| (k, v.to_string())).collect();

    for_each_permutation(&SMALL_RULES, |perm| {
        let mut t = ForwardingTable::new();
        for (from, to) in perm {
            t.add(from, to).unwrap();
        }
        t.validate();

        let rules: Vec<(String, String)> = t.rules().map(|(k, v)| (k, v.to_string())).collect();
        assert_eq!(rules, expected);
        assert_eq!(t.node_count(), reference.node_count());
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    let mut base_model = Model::default();
    for (from, to) in SMALL_RULES {
        assert!(base_model.add(from, to));
    }

    let prefixes = ["1", "12", "123", "2", "*", "13"];
    for_each_permutation(&prefixes, |perm| {
        let mut t = ForwardingTable::new();
        let mut m = base_model.clone();
        for (from, to) in SMALL_RULES {
            t.add(from, to).unwrap();
        }

        for p in perm {
            assert_eq!(t.remove(p), m.remove(p));
            assert_eq!(t.len(), m.rules.len());
            t.validate();
            for probe in ["1", "12", "1234", "2", "*9", "13", "3", "1#"] {
                assert_eq!(t.get(probe).unwrap().into_vec(), m.get(probe));
                assert_eq!(t.reverse(probe).unwrap().into_vec(), m.reverse(probe));
            }
        }
        assert!(t.is_empty());
        assert_eq!(t.node_count(), 2);
    });
}

#[test]
fn randomized_against_model() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const ALPHABET: &[u8] = b"0123*#";

    fn random_number(rng: &mut StdRng) -> String {
        let len = rng.gen_range(1..6);
        (0..len)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    }

    let mut rng = StdRng::seed_from_u64(7);
    let mut t = ForwardingTable::new();
    let mut m = Model::default();

    for _ in 0..20_000 {
        let a = random_number(&mut rng);
        match rng.gen_range(0..100) {
            0..=44 => {
                let b = random_number(&mut rng);
                assert_eq!(t.add(&a, &b).is_ok(), m.add(&a, &b));
            }
            45..=59 => {
                assert_eq!(t.remove(&a), m.remove(&a));
            }
            60..=79 => {
                assert_eq!(t.get(&a).unwrap().into_vec(), m.get(&a));
            }
            _ => {
                assert_eq!(t.reverse(&a).unwrap().into_vec(), m.reverse(&a));
            }
        }
    }

    t.validate();
    assert_eq!(t.len(), m.rules.len());
}
