//! Strongly connected components over the node graph (Tarjan).

/// Marks every node that belongs to a cycle: a component of more than one
/// node, or a node with an edge to itself.
pub(crate) fn cyclic_nodes(edges: &[Vec<usize>]) -> Vec<bool> {
    let mut tarjan = Tarjan {
        edges,
        index: vec![None; edges.len()],
        lowlink: vec![0; edges.len()],
        on_stack: vec![false; edges.len()],
        stack: Vec::new(),
        next_index: 0,
        cyclic: vec![false; edges.len()],
    };
    for node in 0..edges.len() {
        if tarjan.index[node].is_none() {
            tarjan.connect(node);
        }
    }
    tarjan.cyclic
}

struct Tarjan<'a> {
    edges: &'a [Vec<usize>],
    index: Vec<Option<usize>>,
    lowlink: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    next_index: usize,
    cyclic: Vec<bool>,
}

impl Tarjan<'_> {
    fn connect(&mut self, v: usize) {
        self.index[v] = Some(self.next_index);
        self.lowlink[v] = self.next_index;
        self.next_index += 1;
        self.stack.push(v);
        self.on_stack[v] = true;

        let edges = self.edges;
        for &w in &edges[v] {
            match self.index[w] {
                None => {
                    self.connect(w);
                    self.lowlink[v] = self.lowlink[v].min(self.lowlink[w]);
                }
                Some(w_index) if self.on_stack[w] => {
                    self.lowlink[v] = self.lowlink[v].min(w_index);
                }
                Some(_) => {}
            }
        }

        if Some(self.lowlink[v]) == self.index[v] {
            let mut component = Vec::new();
            while let Some(w) = self.stack.pop() {
                self.on_stack[w] = false;
                component.push(w);
                if w == v {
                    break;
                }
            }
            let cyclic = component.len() > 1 || edges[v].contains(&v);
            if cyclic {
                for w in component {
                    self.cyclic[w] = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_cycles_and_self_loops() {
        // 0 -> 1 -> 2 -> 1, 3 -> 3, 4 -> 0
        let edges = vec![vec![1], vec![2], vec![1], vec![3], vec![0]];
        assert_eq!(cyclic_nodes(&edges), [false, true, true, true, false]);
    }

    #[test]
    fn trees_have_no_cycles() {
        let edges = vec![vec![1, 2], vec![], vec![3], vec![]];
        assert_eq!(cyclic_nodes(&edges), [false; 4]);
    }
}
