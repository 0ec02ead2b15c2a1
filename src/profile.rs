//! The account holder's profile singleton.

use crate::db::{LocalStore, Patch, StorageError};
use crate::models::{ProfilePatch, UserProfile};

/// Stored profile, seeding and persisting the default on first use.
pub fn load_profile(store: &LocalStore) -> Result<UserProfile, StorageError> {
    store.get_or_seed_singleton(UserProfile::default)
}

/// Merge `patch` into the stored profile and return the result.
pub fn update_profile(store: &LocalStore, patch: ProfilePatch) -> Result<UserProfile, StorageError> {
    if patch.is_empty() {
        return load_profile(store);
    }
    let profile = store.modify_singleton(|profile: &mut UserProfile| patch.apply_to(profile))?;
    tracing::info!("Profile updated");
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Collection;
    use crate::events::StoreEvent;

    #[test]
    fn first_load_seeds_default() {
        let store = LocalStore::open_in_memory().unwrap();
        let profile = load_profile(&store).unwrap();

        assert_eq!(profile, UserProfile::default());
        assert_eq!(store.get_singleton::<UserProfile>().unwrap(), Some(profile));
    }

    #[test]
    fn update_merges_fields() {
        let store = LocalStore::open_in_memory().unwrap();
        load_profile(&store).unwrap();

        let updated = update_profile(
            &store,
            ProfilePatch {
                name: Some("Priya Nair".into()),
                blood_group: Some("O+".into()),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(updated.name, "Priya Nair");
        assert_eq!(updated.blood_group, "O+");
        assert_eq!(updated.gender, UserProfile::default().gender);
        assert_eq!(load_profile(&store).unwrap(), updated);
    }

    #[test]
    fn update_before_load_starts_from_default() {
        let store = LocalStore::open_in_memory().unwrap();
        let updated = update_profile(
            &store,
            ProfilePatch {
                email: Some("p@example.org".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.name, "Guest Patient");
        assert_eq!(updated.email, "p@example.org");
    }

    #[test]
    fn update_publishes_replaced() {
        let store = LocalStore::open_in_memory().unwrap();
        load_profile(&store).unwrap();
        let mut rx = store.subscribe();

        update_profile(
            &store,
            ProfilePatch {
                phone: Some("555-0142".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            StoreEvent::Replaced { collection: Collection::UserProfile }
        );
    }
}
