//! Family members managed from the account.

use crate::db::{LocalStore, StorageError};
use crate::models::{FamilyMember, FamilyMemberPatch, NewFamilyMember};

pub fn add_family_member(store: &LocalStore, mut draft: NewFamilyMember) -> Result<FamilyMember, StorageError> {
    draft.name = required_name(&draft.name)?;
    let member = store.create::<FamilyMember>(draft)?;
    tracing::info!(member_id = %member.id, "Family member added");
    Ok(member)
}

pub fn list_family_members(store: &LocalStore) -> Result<Vec<FamilyMember>, StorageError> {
    store.get_all()
}

pub fn update_family_member(
    store: &LocalStore,
    id: &str,
    mut patch: FamilyMemberPatch,
) -> Result<Option<FamilyMember>, StorageError> {
    if let Some(name) = patch.name.as_deref() {
        patch.name = Some(required_name(name)?);
    }
    store.update::<FamilyMember>(id, patch)
}

pub fn remove_family_member(store: &LocalStore, id: &str) -> Result<bool, StorageError> {
    store.remove::<FamilyMember>(id)
}

fn required_name(raw: &str) -> Result<String, StorageError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(StorageError::Validation("family member name is required".into()));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str) -> NewFamilyMember {
        NewFamilyMember {
            name: name.into(),
            relationship: "Daughter".into(),
            age: 9,
            phone: "555-0110".into(),
        }
    }

    #[test]
    fn add_trims_and_lists() {
        let store = LocalStore::open_in_memory().unwrap();
        let member = add_family_member(&store, draft("  Mia  ")).unwrap();

        assert_eq!(member.name, "Mia");
        assert_eq!(list_family_members(&store).unwrap(), vec![member]);
    }

    #[test]
    fn blank_name_rejected() {
        let store = LocalStore::open_in_memory().unwrap();
        assert!(matches!(
            add_family_member(&store, draft("   ")),
            Err(StorageError::Validation(_))
        ));
        assert!(list_family_members(&store).unwrap().is_empty());
    }

    #[test]
    fn update_and_remove() {
        let store = LocalStore::open_in_memory().unwrap();
        let member = add_family_member(&store, draft("Mia")).unwrap();

        let older = update_family_member(
            &store,
            &member.id,
            FamilyMemberPatch {
                age: Some(10),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
        assert_eq!(older.age, 10);
        assert_eq!(older.relationship, "Daughter");

        let blank = FamilyMemberPatch {
            name: Some(" ".into()),
            ..Default::default()
        };
        assert!(update_family_member(&store, &member.id, blank).is_err());

        assert!(remove_family_member(&store, &member.id).unwrap());
        assert!(!remove_family_member(&store, &member.id).unwrap());
        assert!(list_family_members(&store).unwrap().is_empty());
    }
}
