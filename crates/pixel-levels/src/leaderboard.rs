//! Leaderboard position by exp.

use crate::error::Result;
use crate::store::ProgressionStore;
use crate::user::{Progression, UserId};

/// All records ordered by exp descending, ties broken by user id ascending.
pub async fn standings(store: &dyn ProgressionStore) -> Result<Vec<(UserId, Progression)>> {
    let mut all = store.list().await?;
    all.sort_by(|(a_id, a), (b_id, b)| b.exp.cmp(&a.exp).then_with(|| a_id.cmp(b_id)));
    Ok(all)
}

/// 1-based rank of `user_id`, `None` if the user has no record.
pub async fn rank_of(store: &dyn ProgressionStore, user_id: &UserId) -> Result<Option<u64>> {
    Ok(standings(store)
        .await?
        .iter()
        .position(|(id, _)| id == user_id)
        .map(|index| index as u64 + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn id(n: u8) -> UserId {
        UserId::parse(&format!("{:018}", n)).unwrap()
    }

    #[tokio::test]
    async fn ranks_by_exp_then_id() {
        let store = MemoryStore::new();
        store.seed(&id(1), Progression::new(100, 1)).await;
        store.seed(&id(2), Progression::new(900, 4)).await;
        store.seed(&id(3), Progression::new(100, 1)).await;

        assert_eq!(rank_of(&store, &id(2)).await.unwrap(), Some(1));
        assert_eq!(rank_of(&store, &id(1)).await.unwrap(), Some(2));
        assert_eq!(rank_of(&store, &id(3)).await.unwrap(), Some(3));
        assert_eq!(rank_of(&store, &id(4)).await.unwrap(), None);
    }
}
