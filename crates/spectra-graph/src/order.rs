//! Dependency ordering.
//!
//! Depth-first post-order over upstream dependencies: every node is emitted
//! after all nodes feeding it. A node reached again while still on the
//! traversal stack closes a cycle.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    New,
    OnStack,
    Done,
}

/// Orders nodes so producers precede consumers.
///
/// `upstream[n]` lists the nodes feeding node `n`. Roots are visited in index
/// order and dependencies in list order, so the result is deterministic.
/// The walk keeps its own stack, so chain depth is bounded only by memory.
///
/// # Errors
///
/// Returns the index of a node on a cycle.
pub fn topological_order(upstream: &[Vec<usize>]) -> Result<Vec<usize>, usize> {
    let mut marks = vec![Mark::New; upstream.len()];
    let mut order = Vec::with_capacity(upstream.len());
    // (node, index of the next dependency to visit)
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..upstream.len() {
        if marks[root] != Mark::New {
            continue;
        }
        marks[root] = Mark::OnStack;
        stack.push((root, 0));

        while let Some((node, next)) = stack.last_mut() {
            let node = *node;
            let Some(&dep) = upstream[node].get(*next) else {
                stack.pop();
                marks[node] = Mark::Done;
                order.push(node);
                continue;
            };
            *next += 1;
            match marks[dep] {
                Mark::Done => {}
                Mark::OnStack => return Err(dep),
                Mark::New => {
                    marks[dep] = Mark::OnStack;
                    stack.push((dep, 0));
                }
            }
        }
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(order: &[usize], node: usize) -> usize {
        order.iter().position(|&n| n == node).unwrap()
    }

    #[test]
    fn chain_with_free_node() {
        // C <- B <- A, D unconnected; listed consumer first.
        let (a, b, c, d) = (2, 1, 0, 3);
        let mut upstream = vec![Vec::new(); 4];
        upstream[b].push(a);
        upstream[c].push(b);

        let order = topological_order(&upstream).unwrap();
        assert_eq!(order.len(), 4);
        assert!(position(&order, a) < position(&order, b));
        assert!(position(&order, b) < position(&order, c));
        assert!(order.contains(&d));
    }

    #[test]
    fn diamond_runs_shared_parent_once() {
        let mut upstream = vec![Vec::new(); 4];
        upstream[1].push(0);
        upstream[2].push(0);
        upstream[3].extend([1, 2]);
        let order = topological_order(&upstream).unwrap();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn cycle_is_reported() {
        let mut upstream = vec![Vec::new(); 3];
        upstream[0].push(2);
        upstream[1].push(0);
        upstream[2].push(1);
        assert!(topological_order(&upstream).is_err());

        let self_loop = vec![vec![0]];
        assert_eq!(topological_order(&self_loop), Err(0));
    }

    #[test]
    fn long_chain_does_not_exhaust_the_stack() {
        // Node n is fed by n + 1, so the first root walks the whole chain.
        let len = 200_000;
        let upstream: Vec<Vec<usize>> = (0..len)
            .map(|n| if n + 1 < len { vec![n + 1] } else { Vec::new() })
            .collect();
        let order = topological_order(&upstream).unwrap();
        assert_eq!(order.len(), len);
        assert!(order.iter().copied().eq((0..len).rev()));

        let mut looped = upstream;
        looped[len - 1].push(0);
        assert!(topological_order(&looped).is_err());
    }
}
