// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::OffsetDateTime;

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }
    };
}

entity_id!(MessageId);
entity_id!(RequestId);

/// Mints message ids from the creation time in milliseconds.
///
/// Two messages created within the same millisecond (a fast backend, or a
/// clock stepping backwards) still get distinct, increasing ids: the new id is
/// bumped one past the previous one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageIdSource {
    last: i64,
}

impl MessageIdSource {
    pub fn next(&mut self, created_at: OffsetDateTime) -> MessageId {
        let millis = i64::try_from(created_at.unix_timestamp_nanos() / 1_000_000)
            .unwrap_or(i64::MAX);
        let value = millis.max(self.last.saturating_add(1));
        self.last = value;
        MessageId::new(value)
    }
}
