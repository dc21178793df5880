// tests/graph_properties.rs

use std::collections::{HashSet, VecDeque};

use proptest::prelude::*;

use lifedag::dag::{Graph, JobId};
use lifedag_test_utils::builders::GraphBuilder;

// Strategy to generate a valid DAG.
// Acyclicity is guaranteed by only letting job N require jobs 0..N-1.
fn dag_strategy(max_jobs: usize) -> impl Strategy<Value = Graph> {
    (1..=max_jobs).prop_flat_map(|num_jobs| {
        proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..3),
            num_jobs,
        )
        .prop_map(|raw| {
            let mut builder = GraphBuilder::new();
            for (i, picks) in raw.into_iter().enumerate() {
                let reqs: HashSet<String> = if i == 0 {
                    HashSet::new()
                } else {
                    picks.into_iter().map(|p| name(p % i)).collect()
                };
                let reqs: Vec<&str> = reqs.iter().map(|s| s.as_str()).collect();
                builder = builder.job(&name(i), &reqs);
            }
            builder.build()
        })
    })
}

fn name(i: usize) -> String {
    format!("job_{i}")
}

fn descendants(graph: &Graph, seed: &str) -> HashSet<String> {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([seed.to_string()]);
    while let Some(id) = queue.pop_front() {
        if seen.insert(id.clone()) {
            for dep in graph.dependents_of(&id) {
                queue.push_back(dep.to_string());
            }
        }
    }
    seen
}

fn reachable(graph: &Graph, from: &str, to: &str) -> bool {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([from.to_string()]);
    while let Some(id) = queue.pop_front() {
        if id == to {
            return true;
        }
        if seen.insert(id.clone()) {
            for req in graph.requirements_of(&id) {
                queue.push_back(req.to_string());
            }
        }
    }
    false
}

fn ids_of(graph: &Graph) -> HashSet<String> {
    graph.jobs().map(|j| j.id().to_string()).collect()
}

proptest! {
    #[test]
    fn surgery_preserves_acyclicity(graph in dag_strategy(12), pick in any::<usize>()) {
        let target = name(pick % graph.len());
        let elided = graph.bypass_and_remove(&target).unwrap();
        prop_assert!(elided.check_cycles().is_ok());

        let kept = graph
            .keep_only_between(&[JobId::new(target.as_str())], &[], true)
            .unwrap();
        prop_assert!(kept.check_cycles().is_ok());
    }

    #[test]
    fn forward_extraction_is_the_descendant_set(graph in dag_strategy(12), pick in any::<usize>()) {
        let start = name(pick % graph.len());
        let kept = graph
            .keep_only_between(&[JobId::new(start.as_str())], &[], true)
            .unwrap();
        prop_assert_eq!(ids_of(&kept), descendants(&graph, &start));
    }

    #[test]
    fn extraction_is_idempotent(
        graph in dag_strategy(12),
        s in any::<usize>(),
        e in any::<usize>(),
        keep_ends in any::<bool>(),
    ) {
        let starts = vec![JobId::new(name(s % graph.len()))];
        let ends = vec![JobId::new(name(e % graph.len()))];

        let once = graph.keep_only_between(&starts, &ends, true).unwrap();
        // Either the start reaches the end, and both frontiers survive, or
        // nothing lies between them.
        if !once.is_empty() {
            let twice = once.keep_only_between(&starts, &ends, true).unwrap();
            prop_assert_eq!(ids_of(&once), ids_of(&twice));
            prop_assert_eq!(once.edge_count(), twice.edge_count());
        }

        if !keep_ends {
            let dropped = graph.keep_only_between(&starts, &ends, false).unwrap();
            prop_assert!(!dropped.contains(ends[0].as_str()));
        }
    }

    #[test]
    fn non_empty_graph_has_an_entry_job(graph in dag_strategy(12), pick in any::<usize>()) {
        prop_assert!(!graph.entry_jobs().is_empty());

        let target = name(pick % graph.len());
        let elided = graph.bypass_and_remove(&target).unwrap();
        prop_assert_eq!(elided.is_empty(), elided.entry_jobs().is_empty());
    }

    #[test]
    fn bypass_preserves_reachability(graph in dag_strategy(10), pick in any::<usize>()) {
        let target = name(pick % graph.len());
        let elided = graph.bypass_and_remove(&target).unwrap();

        let others: Vec<String> = ids_of(&graph).into_iter().filter(|id| *id != target).collect();
        for a in &others {
            for b in &others {
                prop_assert_eq!(
                    reachable(&graph, a, b),
                    reachable(&elided, a, b),
                    "reachability {} -> {} changed", a, b
                );
            }
        }
    }

    #[test]
    fn topological_order_puts_requirements_first(graph in dag_strategy(12)) {
        let order: Vec<String> = graph
            .topological_order()
            .unwrap()
            .into_iter()
            .map(|j| j.id().to_string())
            .collect();
        prop_assert_eq!(order.len(), graph.len());
        for (pos, id) in order.iter().enumerate() {
            for req in graph.requirements_of(id) {
                let req_pos = order.iter().position(|o| o == req.as_str()).unwrap();
                prop_assert!(req_pos < pos);
            }
        }
    }
}
