//! Score widening and the `Taggable` capability.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

/// A value that can be stored in a collection
///
/// `identifier` plays the role of the `id` tag and is required: an empty
/// identifier makes record construction fail. `sort_score` plays the role of
/// the `score` tag; `None` sorts the record as "now".
pub trait Taggable: Serialize {
    fn identifier(&self) -> String;

    fn sort_score(&self) -> Option<f64> {
        None
    }
}

/// Widening of a tagged score field into `f64`
pub trait IntoScore {
    fn into_score(&self) -> Option<f64>;
}

macro_rules! widen_numeric {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoScore for $ty {
                fn into_score(&self) -> Option<f64> {
                    Some(*self as f64)
                }
            }
        )*
    };
}

widen_numeric!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl IntoScore for SystemTime {
    fn into_score(&self) -> Option<f64> {
        Some(epoch_seconds(*self) as f64)
    }
}

impl<T: IntoScore> IntoScore for Option<T> {
    fn into_score(&self) -> Option<f64> {
        self.as_ref().and_then(IntoScore::into_score)
    }
}

impl<T: IntoScore + ?Sized> IntoScore for &T {
    fn into_score(&self) -> Option<f64> {
        (**self).into_score()
    }
}

/// Whole seconds since the Unix epoch, negative before it
pub fn epoch_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => after.as_secs() as i64,
        Err(before) => {
            let d = before.duration();
            // floor, like a Unix timestamp
            -(d.as_secs() as i64) - i64::from(d.subsec_nanos() > 0)
        }
    }
}

/// Score used when a value carries none
pub fn now_score() -> f64 {
    epoch_seconds(SystemTime::now()) as f64
}

/// Implements [`Taggable`](crate::Taggable) from field names.
///
/// ```
/// use pagekv::impl_taggable;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Post { id: u64, created: i64, body: String }
///
/// impl_taggable!(Post, id = id, score = created);
/// ```
#[macro_export]
macro_rules! impl_taggable {
    ($ty:ty, id = $id:ident) => {
        impl $crate::Taggable for $ty {
            fn identifier(&self) -> ::std::string::String {
                ::std::string::ToString::to_string(&self.$id)
            }
        }
    };
    ($ty:ty, id = $id:ident, score = $score:ident) => {
        impl $crate::Taggable for $ty {
            fn identifier(&self) -> ::std::string::String {
                ::std::string::ToString::to_string(&self.$id)
            }

            fn sort_score(&self) -> ::std::option::Option<f64> {
                $crate::record::IntoScore::into_score(&self.$score)
            }
        }
    };
}
