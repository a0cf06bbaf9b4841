use async_trait::async_trait;
use etymo_core::{Row, RowStore, StoreError};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryRowStore {
    rows: RwLock<Vec<Row>>,
}

impl InMemoryRowStore {
    pub async fn rows(&self) -> Vec<Row> {
        self.rows.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl RowStore for InMemoryRowStore {
    async fn append(&self, row: &Row) -> Result<(), StoreError> {
        self.rows.write().await.push(row.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use etymo_core::{Row, RowStore};

    use super::InMemoryRowStore;

    #[tokio::test]
    async fn keeps_duplicate_rows_in_order() {
        let store = InMemoryRowStore::default();

        store.append(&Row::new("שלום", "peace")).await.expect("append");
        store.append(&Row::new("שלום", "peace")).await.expect("append");
        store.append(&Row::new("מכין", "preparing")).await.expect("append");

        let words: Vec<String> = store.rows().await.into_iter().map(|row| row.word).collect();
        assert_eq!(words, ["שלום", "שלום", "מכין"]);
        assert_eq!(store.len().await, 3);
    }
}
