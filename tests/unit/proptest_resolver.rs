//! Property-based tests for the resolver
//!
//! Uses proptest to generate random dependency graphs and check the
//! properties every plan must have.

use std::collections::HashMap;

use nrdiag::core::services::{Catalogue, Resolver, Selection};
use proptest::prelude::*;

use crate::common::{MockTask, catalogue_of};

fn name(i: usize) -> String {
    format!("Gen/Task/T{i:02}")
}

/// Each task may depend on any earlier task, so the graph is acyclic
fn acyclic_graph() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1_usize..16).prop_flat_map(|n| {
        (0..n)
            .map(|i| {
                if i == 0 {
                    Just(Vec::new()).boxed()
                } else {
                    prop::collection::vec(0..i, 0..4).boxed()
                }
            })
            .collect::<Vec<_>>()
    })
}

fn build(graph: &[Vec<usize>]) -> Catalogue {
    catalogue_of(graph.iter().enumerate().map(|(i, deps)| {
        let deps: Vec<String> = deps.iter().map(|d| name(*d)).collect();
        let deps: Vec<&str> = deps.iter().map(String::as_str).collect();
        MockTask::new(&name(i)).depends_on(&deps)
    }))
}

proptest! {
    /// Every dependency is ordered before its dependent
    #[test]
    fn dependencies_precede_dependents(graph in acyclic_graph()) {
        let catalogue = build(&graph);
        let plan = Resolver::new(&catalogue).resolve(&Selection::all());

        prop_assert!(plan.is_clean());
        prop_assert_eq!(plan.len(), graph.len());

        let position: HashMap<String, usize> =
            plan.order().iter().enumerate().map(|(i, id)| (id.to_string(), i)).collect();
        for (i, deps) in graph.iter().enumerate() {
            for dep in deps {
                prop_assert!(position[&name(*dep)] < position[&name(i)]);
            }
        }
    }

    /// Resolving twice gives the same plan
    #[test]
    fn plans_are_deterministic(graph in acyclic_graph()) {
        let catalogue = build(&graph);
        let resolver = Resolver::new(&catalogue);

        let first = resolver.resolve(&Selection::all());
        let second = resolver.resolve(&Selection::all());
        prop_assert_eq!(first.order(), second.order());
    }

    /// Selecting one task plans exactly its dependency closure
    #[test]
    fn single_selection_plans_its_closure(
        graph in acyclic_graph(),
        pick in any::<prop::sample::Index>(),
    ) {
        let catalogue = build(&graph);
        let root = pick.index(graph.len());

        let mut closure = vec![false; graph.len()];
        let mut pending = vec![root];
        while let Some(node) = pending.pop() {
            if !closure[node] {
                closure[node] = true;
                pending.extend(graph[node].iter().copied());
            }
        }

        let plan = Resolver::new(&catalogue).resolve(&Selection::parse(&[name(root)]).unwrap());
        prop_assert_eq!(plan.len(), closure.iter().filter(|c| **c).count());
        prop_assert_eq!(plan.order().last().map(ToString::to_string), Some(name(root)));
    }

    /// Adding a back edge always yields a cycle and never an order
    #[test]
    fn back_edge_is_reported_as_cycle(graph in acyclic_graph()) {
        prop_assume!(graph.len() > 1);
        let last = graph.len() - 1;
        let mut graph = graph;
        graph[last].push(0);
        graph[0].push(last);

        let catalogue = build(&graph);
        let plan = Resolver::new(&catalogue).resolve(&Selection::all());

        prop_assert!(!plan.is_clean());
        prop_assert!(!plan.contains(&name(0).parse().unwrap()));
        prop_assert!(!plan.contains(&name(last).parse().unwrap()));
    }
}
