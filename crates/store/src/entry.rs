use std::collections::HashMap;

/// Tipo do valor armazenado. A variante é fixada na criação da entrada:
/// comandos que não casam com o tipo falham sem tocar a recência.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    List(Vec<String>),
    Hash(HashMap<String, String>),
}

/// Entrada no store: o valor e o slot do nó correspondente na lista de
/// recência. Remoção limpa os dois lados sob o mesmo lock.
#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub(crate) value: Value,
    pub(crate) slot: usize,
}

impl Entry {
    pub(crate) fn new(value: Value, slot: usize) -> Self {
        Self { value, slot }
    }
}
