use std::collections::HashMap;
use std::error::Error;
use std::fmt::Debug;
use std::hash::Hash;
use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

pub trait WithPrimaryKey<K> {
    fn primary_key(&self) -> K;
}

pub trait PrimaryKeyTable<K, V>
where
    V: WithPrimaryKey<K>,
{
    fn get(&self, key: &K) -> Option<V>;

    fn get_all(&self) -> Vec<V>;

    fn insert(&mut self, value: V);
}

pub fn read_csv<T, K, V, R>(table: &mut T, reader: R) -> Result<(), Box<dyn Error>>
where
    T: PrimaryKeyTable<K, V>,
    V: WithPrimaryKey<K>,
    V: DeserializeOwned,
    R: Read,
{
    let mut csv_reader = csv::Reader::from_reader(reader);
    for row in csv_reader.deserialize() {
        let value: V = row?;
        table.insert(value);
    }
    Ok(())
}

/// Deserialize every row of `reader` into `T`, ignoring primary keys. Used for
/// files where more than one row may legitimately share a key, such as
/// `calendar_dates.txt` or `stop_times.txt`.
pub fn read_csv_rows<T, R>(reader: R) -> Result<Vec<T>, Box<dyn Error>>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for row in csv_reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

pub fn write_csv_rows<T, W>(writer: W, rows: &[T]) -> Result<(), Box<dyn Error>>
where
    T: Serialize,
    W: Write,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[derive(Clone)]
pub struct InMemoryPrimaryKeyTable<K, V> {
    map: HashMap<K, V>,
}

impl<K, V> InMemoryPrimaryKeyTable<K, V>
where
    K: Eq,
    K: Hash,
    V: WithPrimaryKey<K>,
{
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn from_rows(rows: Vec<V>) -> Self {
        let mut map = HashMap::<K, V>::new();
        for row in rows {
            map.insert(row.primary_key(), row);
        }
        Self { map }
    }
}

impl<K, V> Default for InMemoryPrimaryKeyTable<K, V>
where
    K: Eq,
    K: Hash,
    V: WithPrimaryKey<K>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> PrimaryKeyTable<K, V> for InMemoryPrimaryKeyTable<K, V>
where
    K: Eq,
    K: Hash,
    K: Debug,
    V: Clone,
    V: WithPrimaryKey<K>,
{
    fn get(&self, key: &K) -> Option<V> {
        self.map.get(key).cloned()
    }

    fn get_all(&self) -> Vec<V> {
        self.map.values().cloned().collect::<Vec<_>>()
    }

    fn insert(&mut self, value: V) {
        self.map.insert(value.primary_key(), value);
    }
}
