//! Identifier helpers

use bech32::Bech32m;
use uuid7::uuid7;

/// Human readable prefix for leave request ids
pub const LEAVE_HRP: &str = "leave_";

// construct a unique id from a fresh uuid7 then encode using bech32m
pub fn new_uuid_to_bech32(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(encode)
}

pub fn new_leave_id() -> anyhow::Result<String> {
    new_uuid_to_bech32(LEAVE_HRP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leave_ids_carry_prefix() {
        let id = new_leave_id().unwrap();
        assert!(id.starts_with("leave_1"));
    }

    #[test]
    fn leave_ids_are_unique() {
        let a = new_leave_id().unwrap();
        let b = new_leave_id().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn empty_hrp_is_rejected() {
        assert!(new_uuid_to_bech32("").is_err());
    }
}
