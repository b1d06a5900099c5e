use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use serde::Deserialize;

/// Backend do cluster: endereço + peso, onde o peso é o número de nós
/// virtuais que o backend contribui para o anel. A igualdade é
/// estrutural: o mesmo endereço com peso diferente conta como outro
/// backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct Backend {
    pub addr: String,
    pub weight: u32,
}

#[derive(Default)]
struct RingState {
    /// Hashes dos nós virtuais, ordenados para a busca binária.
    nodes: Vec<u32>,
    backends: HashSet<Backend>,
    node_to_backend: HashMap<u32, Backend>,
}

/// Anel de hashing consistente com nós virtuais ponderados. O lookup é
/// o hot path e pega o lock compartilhado; mutações de associação pegam
/// o exclusivo.
pub struct Ring {
    state: RwLock<RingState>,
}

impl Ring {
    pub fn new() -> Self {
        Ring {
            state: RwLock::new(RingState::default()),
        }
    }

    /// Aplica o conjunto-alvo de backends por diff: remove os que
    /// saíram, adiciona os que entraram, reordena uma vez.
    pub fn adjust(&self, target: &[Backend]) {
        let target_set: HashSet<Backend> = target.iter().cloned().collect();

        let mut state = self.state.write();

        let removed: Vec<Backend> = state
            .backends
            .difference(&target_set)
            .cloned()
            .collect();
        for backend in &removed {
            remove_from(&mut state, backend);
        }

        let added: Vec<Backend> = target_set
            .iter()
            .filter(|backend| !state.backends.contains(*backend))
            .cloned()
            .collect();
        for backend in added {
            add_to(&mut state, backend);
        }

        state.nodes.sort_unstable();
    }

    pub fn add_backend(&self, backend: Backend) {
        let mut state = self.state.write();
        add_to(&mut state, backend);
        state.nodes.sort_unstable();
    }

    pub fn remove_backend(&self, backend: &Backend) {
        let mut state = self.state.write();
        remove_from(&mut state, backend);
    }

    /// Dono da chave: o backend do primeiro nó virtual com hash >= ao
    /// hash da chave, com wraparound para o índice 0. Determinístico
    /// para uma associação fixa; None com o anel vazio.
    pub fn get(&self, key: &str) -> Option<Backend> {
        let state = self.state.read();
        if state.nodes.is_empty() {
            return None;
        }

        let hash = crc32fast::hash(key.as_bytes());
        let i = state.nodes.partition_point(|&node| node < hash);
        let node = if i == state.nodes.len() {
            state.nodes[0]
        } else {
            state.nodes[i]
        };

        state.node_to_backend.get(&node).cloned()
    }

    /// Número de backends na associação atual.
    pub fn len(&self) -> usize {
        self.state.read().backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, backend: &Backend) -> bool {
        self.state.read().backends.contains(backend)
    }
}

impl Default for Ring {
    fn default() -> Self {
        Self::new()
    }
}

/// Gera os nós virtuais do backend: CRC32 do endereço, anexando um byte
/// sentinela por iteração para produzir pontos distintos e repetíveis.
fn add_to(state: &mut RingState, backend: Backend) {
    if state.backends.contains(&backend) {
        return;
    }

    let mut input = backend.addr.clone().into_bytes();
    for _ in 0..backend.weight {
        let hash = crc32fast::hash(&input);
        state.nodes.push(hash);
        state.node_to_backend.insert(hash, backend.clone());
        input.push(b'_');
    }
    state.backends.insert(backend);
}

fn remove_from(state: &mut RingState, backend: &Backend) {
    if !state.backends.contains(backend) {
        return;
    }

    // remover o último backend zera as três estruturas
    if state.backends.len() == 1 {
        *state = RingState::default();
        return;
    }

    let RingState {
        nodes,
        backends,
        node_to_backend,
    } = state;
    nodes.retain(|node| node_to_backend.get(node) != Some(backend));
    node_to_backend.retain(|_, owner| owner != backend);
    backends.remove(backend);
}
