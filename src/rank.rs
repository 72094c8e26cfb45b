//! Dependency ranking of tables for CREATE and DROP ordering.
//!
//! Edges run from a table to every table it references. A table's rank is
//! one plus the ranks of everything that references it, so referenced tables
//! rank higher and are created first. Mutually referencing tables collapse
//! into one strongly connected component and share its rank.

use std::cmp::Reverse;

use tracing::debug;

use crate::registry::TableRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranking {
    /// Table names in declaration order.
    names: Vec<String>,
    /// `None` for tables with no edge at all.
    ranks: Vec<Option<u64>>,
}

impl Ranking {
    pub fn new(registry: &TableRegistry) -> Self {
        let names = registry.names();
        let mut succ = vec![Vec::new(); names.len()];
        let mut linked = vec![false; names.len()];

        for (i, table) in registry.iter().enumerate() {
            for target in &table.refs {
                let Some(j) = registry.index_of(target) else {
                    continue;
                };
                if i == j {
                    continue;
                }
                succ[i].push(j);
                linked[i] = true;
                linked[j] = true;
            }
        }

        let components = Tarjan::run(&succ);

        // component index per node
        let mut component_of = vec![0; names.len()];
        for (c, members) in components.iter().enumerate() {
            for &v in members {
                component_of[v] = c;
            }
        }

        // Tarjan emits components sinks first; walk them sources first.
        let mut preds: Vec<Vec<usize>> = vec![Vec::new(); components.len()];
        for (v, targets) in succ.iter().enumerate() {
            for &w in targets {
                let (from, to) = (component_of[v], component_of[w]);
                if from != to && !preds[to].contains(&from) {
                    preds[to].push(from);
                }
            }
        }

        let mut component_rank = vec![0u64; components.len()];
        for c in (0..components.len()).rev() {
            component_rank[c] = preds[c]
                .iter()
                .fold(1u64, |acc, &p| acc.saturating_add(component_rank[p]));
        }

        let ranks = (0..names.len())
            .map(|v| linked[v].then(|| component_rank[component_of[v]]))
            .collect();

        debug!(tables = names.len(), components = components.len(), "ranked tables");
        Self { names, ranks }
    }

    pub fn rank(&self, name: &str) -> Option<u64> {
        let i = self.names.iter().position(|n| n == name)?;
        self.ranks[i]
    }

    /// Referenced tables first; unranked tables last in declaration order.
    pub fn create_order(&self) -> Vec<&str> {
        let mut ranked: Vec<usize> = self.ranked().collect();
        ranked.sort_by_key(|&i| Reverse(self.ranks[i]));
        self.with_unranked(ranked)
    }

    /// Referencing tables first; unranked tables last in declaration order.
    pub fn drop_order(&self) -> Vec<&str> {
        let mut ranked: Vec<usize> = self.ranked().collect();
        ranked.sort_by_key(|&i| self.ranks[i]);
        self.with_unranked(ranked)
    }

    fn ranked(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.names.len()).filter(|&i| self.ranks[i].is_some())
    }

    fn with_unranked(&self, ranked: Vec<usize>) -> Vec<&str> {
        let unranked = (0..self.names.len()).filter(|&i| self.ranks[i].is_none());
        ranked
            .into_iter()
            .chain(unranked)
            .map(|i| self.names[i].as_str())
            .collect()
    }
}

/// Tarjan's strongly connected components over an adjacency list.
struct Tarjan<'g> {
    succ: &'g [Vec<usize>],
    index: Vec<Option<usize>>,
    lowlink: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    next_index: usize,
    components: Vec<Vec<usize>>,
}

impl<'g> Tarjan<'g> {
    fn run(succ: &'g [Vec<usize>]) -> Vec<Vec<usize>> {
        let n = succ.len();
        let mut tarjan = Tarjan {
            succ,
            index: vec![None; n],
            lowlink: vec![0; n],
            on_stack: vec![false; n],
            stack: Vec::new(),
            next_index: 0,
            components: Vec::new(),
        };
        for v in 0..n {
            if tarjan.index[v].is_none() {
                tarjan.connect(v);
            }
        }
        tarjan.components
    }

    fn connect(&mut self, v: usize) {
        self.index[v] = Some(self.next_index);
        self.lowlink[v] = self.next_index;
        self.next_index += 1;
        self.stack.push(v);
        self.on_stack[v] = true;

        for &w in &self.succ[v] {
            match self.index[w] {
                None => {
                    self.connect(w);
                    self.lowlink[v] = self.lowlink[v].min(self.lowlink[w]);
                }
                Some(index) if self.on_stack[w] => {
                    self.lowlink[v] = self.lowlink[v].min(index);
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
            component.sort_unstable();
            self.components.push(component);
        }
    }
}
