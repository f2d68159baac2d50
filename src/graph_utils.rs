use crate::qubo::QuadraticModel;
use std::collections::HashMap;

/// Given a model and a set of fixed variables, find all disconnected subgraphs of the interaction
/// graph that do not include any fixed variables. Each subgraph is represented as a vector of
/// variable indices, sorted ascending; subgraphs are ordered by their smallest variable.
pub fn get_all_disconnected_graphs(
    model: &QuadraticModel,
    fixed_vars: &HashMap<usize, usize>,
) -> Vec<Vec<usize>> {
    let num_x = model.num_variables();
    let mut visited = (0..num_x)
        .map(|x| fixed_vars.contains_key(&x))
        .collect::<Vec<bool>>();

    let mut output = Vec::new();

    for v in 0..num_x {
        if visited[v] {
            continue;
        }

        // depth first search with an explicit stack, chains can be as long as the model
        let mut component = Vec::new();
        let mut stack = vec![v];
        visited[v] = true;

        while let Some(u) = stack.pop() {
            component.push(u);

            for (j, _) in model.adjacency_row(u) {
                if !visited[j] {
                    visited[j] = true;
                    stack.push(j);
                }
            }
        }

        component.sort_unstable();
        output.push(component);
    }

    output
}

/// Strongly connected components of a directed graph given by successor lists.
///
/// Returns the component of every node. Components are numbered in the order Tarjan's algorithm
/// closes them, which is a reverse topological order of the condensation: if there is a path from
/// component `a` to a different component `b`, then `b < a`.
pub fn strongly_connected_components(successors: &[Vec<usize>]) -> Vec<usize> {
    const UNVISITED: usize = usize::MAX;

    let num_nodes = successors.len();
    let mut index = vec![UNVISITED; num_nodes];
    let mut lowlink = vec![0usize; num_nodes];
    let mut on_stack = vec![false; num_nodes];
    let mut component = vec![UNVISITED; num_nodes];

    let mut stack = Vec::new();
    let mut next_index = 0usize;
    let mut num_components = 0usize;

    for root in 0..num_nodes {
        if index[root] != UNVISITED {
            continue;
        }

        // each frame holds a node and the position of the next successor to look at
        let mut call_stack = vec![(root, 0usize)];
        index[root] = next_index;
        lowlink[root] = next_index;
        next_index += 1;
        stack.push(root);
        on_stack[root] = true;

        while let Some(frame) = call_stack.last_mut() {
            let v = frame.0;

            if frame.1 < successors[v].len() {
                let w = successors[v][frame.1];
                frame.1 += 1;

                if index[w] == UNVISITED {
                    index[w] = next_index;
                    lowlink[w] = next_index;
                    next_index += 1;
                    stack.push(w);
                    on_stack[w] = true;
                    call_stack.push((w, 0));
                } else if on_stack[w] {
                    lowlink[v] = lowlink[v].min(index[w]);
                }
                continue;
            }

            // all successors of v are done
            call_stack.pop();

            if lowlink[v] == index[v] {
                while let Some(w) = stack.pop() {
                    on_stack[w] = false;
                    component[w] = num_components;
                    if w == v {
                        break;
                    }
                }
                num_components += 1;
            }

            if let Some(&(parent, _)) = call_stack.last() {
                lowlink[parent] = lowlink[parent].min(lowlink[v]);
            }
        }
    }

    component
}

#[cfg(test)]
mod tests {
    use crate::graph_utils::{get_all_disconnected_graphs, strongly_connected_components};
    use crate::qubo::{QuadraticModel, Vartype};
    use std::collections::HashMap;

    fn make_model(num_x: usize, edges: &[(usize, usize)]) -> QuadraticModel {
        let mut p = QuadraticModel::new(num_x, Vartype::Binary);
        for &(i, j) in edges {
            p.set_quadratic(i, j, 1.0).unwrap();
        }
        p
    }

    #[test]
    fn test_disconnected_graphs_1() {
        // edges 0 - 1 - 2 and 3 - 4
        let p = make_model(5, &[(0, 1), (1, 2), (3, 4)]);

        let fixed_vars = HashMap::new();
        let components = get_all_disconnected_graphs(&p, &fixed_vars);

        // we expect two components: [0, 1, 2] and [3, 4]
        assert_eq!(components, vec![vec![0, 1, 2], vec![3, 4]]);

        // now test with fixing variable 1
        let mut fixed_vars = HashMap::new();
        fixed_vars.insert(1, 0);
        let components = get_all_disconnected_graphs(&p, &fixed_vars);

        // we expect three components: [0], [2], and [3, 4]
        assert_eq!(components, vec![vec![0], vec![2], vec![3, 4]]);
    }

    #[test]
    fn test_disconnected_graphs_2() {
        // test a star graph, edges 0 - 1, 0 - 2, 0 - 3, 0 - 4
        let p = make_model(5, &[(0, 1), (0, 2), (0, 3), (0, 4)]);

        let components = get_all_disconnected_graphs(&p, &HashMap::new());
        // we expect one component: [0, 1, 2, 3, 4]
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].len(), 5);

        // now test with fixing variable 0
        let mut fixed_vars = HashMap::new();
        fixed_vars.insert(0, 0);

        let components = get_all_disconnected_graphs(&p, &fixed_vars);
        // we expect four components: [1], [2], [3], and [4]
        assert_eq!(components.len(), 4);
        for i in 1..5 {
            assert!(components.iter().any(|c| c.len() == 1 && c.contains(&i)));
        }
    }

    #[test]
    fn test_disconnected_graphs_3() {
        // we are testing a circle graph, edges 0 - 1 - 2 - 3 - 0
        let p = make_model(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
        let components = get_all_disconnected_graphs(&p, &HashMap::new());

        // we expect one component: [0, 1, 2, 3]
        assert_eq!(components, vec![vec![0, 1, 2, 3]]);

        // now test with fixing variable 1
        let mut fixed_vars = HashMap::new();
        fixed_vars.insert(1, 0);
        let components = get_all_disconnected_graphs(&p, &fixed_vars);

        // we expect one component: [0, 2, 3]
        assert_eq!(components, vec![vec![0, 2, 3]]);
    }

    #[test]
    fn test_scc_orders_sinks_first() {
        // 0 <-> 1 -> 2 <-> 3, 4 alone
        let successors = vec![vec![1], vec![0, 2], vec![3], vec![2], vec![]];
        let component = strongly_connected_components(&successors);

        assert_eq!(component[0], component[1]);
        assert_eq!(component[2], component[3]);
        assert_ne!(component[0], component[2]);
        assert_ne!(component[4], component[0]);

        // {2, 3} is reachable from {0, 1}, so it has to be closed first
        assert!(component[2] < component[0]);
    }

    #[test]
    fn test_scc_long_chain_does_not_recurse() {
        // a single path of 200_000 nodes would overflow a recursive implementation
        let num_nodes = 200_000;
        let successors = (0..num_nodes)
            .map(|i| if i + 1 < num_nodes { vec![i + 1] } else { vec![] })
            .collect::<Vec<_>>();

        let component = strongly_connected_components(&successors);

        // every node is its own component and the chain is numbered from its end
        assert_eq!(component[num_nodes - 1], 0);
        assert_eq!(component[0], num_nodes - 1);
    }
}
