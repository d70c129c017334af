//! Identifier generation.
//!
//! Every row id is a UUIDv7: the leading 48 bits are a millisecond Unix
//! timestamp, so ids sort roughly by creation time.

use uuid::Uuid;

/// Generate a new UUIDv7 identifier.
#[inline]
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_v7_is_version_7() {
        assert_eq!(new_v7().get_version_num(), 7);
    }

    #[test]
    fn test_v7_ordering() {
        let a = new_v7();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = new_v7();
        assert!(b > a);
    }
}
