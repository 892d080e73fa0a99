//! Concrete container families.
//!
//! Each module pins one key/value pairing and names it by the descriptor
//! prefixes, so `families::uo::Bucket` is a bucket of `u32` keys and
//! [`Object`](crate::Object) values. The modules only hold aliases; every
//! family shares the one generic implementation.
//!
//! ```
//! use btree_buckets::families::{io, oo};
//! use btree_buckets::{Object, OrderedLeaf};
//!
//! assert_eq!(oo::Family::type_name("Bucket"), "OOBucket");
//! assert_eq!(<io::Bucket as OrderedLeaf>::MAX_SIZE, 60);
//!
//! let mut bucket = io::Bucket::new();
//! bucket.insert(7, Object::from("seven"))?;
//! # Ok::<(), btree_buckets::Error>(())
//! ```

macro_rules! family {
    ($name:ident, $key:ty, $value:ty) => {
        #[doc = concat!("`", stringify!($key), "` keys with `", stringify!($value), "` values.")]
        pub mod $name {
            #[allow(unused_imports)]
            use crate::Object;

            pub type Bucket = crate::Bucket<$key, $value>;
            pub type Set = crate::Set<$key>;
            pub type BucketState = crate::BucketState<$key, $value>;
            pub type SetState = crate::SetState<$key>;
            pub type Family = crate::Family<$key, $value>;
        }
    };
}

family!(oo, Object, Object);
family!(oi, Object, i32);
family!(ou, Object, u32);
family!(ol, Object, i64);
family!(oq, Object, u64);
family!(io, i32, Object);
family!(ii, i32, i32);
family!(iu, i32, u32);
family!(uo, u32, Object);
family!(ui, u32, i32);
family!(uu, u32, u32);
family!(uf, u32, f32);
family!(lo, i64, Object);
family!(ll, i64, i64);
family!(lq, i64, u64);
family!(lf, i64, f32);
family!(qo, u64, Object);
family!(ql, u64, i64);
family!(qq, u64, u64);
family!(qf, u64, f32);
