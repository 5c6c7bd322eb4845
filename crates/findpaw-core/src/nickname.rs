//! Default nicknames for users who never set one.

use rand::Rng;
use uuid::Uuid;

const DOG_NAMES: &[&str] = &[
    "Ppoppi", "Choco", "Mongi", "Louis", "Coco", "Mungi", "Byeoli", "Haneuli", "Gureumi",
    "Baduki", "Nabi", "Toto", "Mimi", "Ttoli", "Boksili", "Kkami", "Duri", "Ttori", "Bori",
    "Nuri", "Maknae", "Maru", "Bangouli", "Heart",
];

/// Picks a base dog name from the user id so the same user keeps the same
/// base name across profile re-creations.
fn base_name_for(user_id: &Uuid) -> &'static str {
    let hash = user_id
        .to_string()
        .encode_utf16()
        .fold(0i32, |acc, unit| {
            i32::from(unit).wrapping_add(acc.wrapping_shl(5).wrapping_sub(acc))
        });
    let index = usize::try_from(hash.unsigned_abs()).unwrap_or(0) % DOG_NAMES.len();
    DOG_NAMES[index]
}

/// Generates a nickname such as `"Choco417"`: a base name derived from the
/// user id plus a random 3-digit suffix.
#[must_use]
pub fn default_nickname(user_id: &Uuid) -> String {
    let suffix: u16 = rand::rng().random_range(100..1000);
    format!("{}{suffix}", base_name_for(user_id))
}

/// Returns the stored nickname, or a generated default when it is missing or blank.
#[must_use]
pub fn display_nickname(nickname: Option<&str>, user_id: &Uuid) -> String {
    match nickname {
        Some(n) if !n.trim().is_empty() => n.to_string(),
        _ => default_nickname(user_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_is_stable_for_a_user() {
        let id = Uuid::new_v4();
        assert_eq!(base_name_for(&id), base_name_for(&id));
    }

    #[test]
    fn default_nickname_has_three_digit_suffix() {
        let id = Uuid::new_v4();
        let nick = default_nickname(&id);
        let base = base_name_for(&id);
        let suffix = nick.strip_prefix(base).expect("starts with base name");
        let n: u16 = suffix.parse().expect("numeric suffix");
        assert!((100..1000).contains(&n), "suffix {n} out of range");
    }

    #[test]
    fn display_nickname_prefers_stored_value() {
        let id = Uuid::new_v4();
        assert_eq!(display_nickname(Some("Rex"), &id), "Rex");
        assert!(display_nickname(Some("  "), &id).starts_with(base_name_for(&id)));
        assert!(display_nickname(None, &id).starts_with(base_name_for(&id)));
    }
}
