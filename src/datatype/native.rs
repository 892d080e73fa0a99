use super::{KeyType, UnionKey, ValueType, WeightedValue};

macro_rules! integer_datatype {
    ($ty:ty, $prefix:literal, $long_name:literal, $wide:literal) => {
        impl KeyType for $ty {
            const PREFIX: &'static str = $prefix;
            const LONG_NAME: &'static str = $long_name;
            const TREE_SIZE: usize = 500;
            const NATIVE_VALUE_LEAF_SIZE: usize = 120;
            const OBJECT_VALUE_LEAF_SIZE: usize = 60;
            const SET_LEAF_SIZE: usize = 120;
            const USING_64_BITS: bool = $wide;
            const SUPPORTS_VALUE_UNION: bool = true;
        }

        impl UnionKey for $ty {}

        impl ValueType for $ty {
            const PREFIX: &'static str = $prefix;
            const LONG_NAME: &'static str = $long_name;
            const USING_64_BITS: bool = $wide;
            const SUPPORTS_VALUE_UNION: bool = true;
            const NATIVE: bool = true;
        }

        // Fixed-width arithmetic wraps rather than panicking on overflow.
        impl WeightedValue for $ty {
            const IDENTITY: Self = 1;

            #[inline]
            fn apply_weight(&self, weight: &Self) -> Self {
                self.wrapping_mul(*weight)
            }

            #[inline]
            fn merge_weighted(&self, weight: &Self, other: &Self, other_weight: &Self) -> Self {
                self.wrapping_mul(*weight).wrapping_add(other.wrapping_mul(*other_weight))
            }
        }
    };
}

integer_datatype!(i32, "I", "Integer", false);
integer_datatype!(u32, "U", "UnsignedInteger", false);
integer_datatype!(i64, "L", "Long", true);
integer_datatype!(u64, "Q", "UnsignedLong", true);

impl ValueType for f32 {
    const PREFIX: &'static str = "F";
    const LONG_NAME: &'static str = "Float";
    const USING_64_BITS: bool = false;
    const SUPPORTS_VALUE_UNION: bool = true;
    const NATIVE: bool = true;
}

impl WeightedValue for f32 {
    const IDENTITY: Self = 1.0;

    #[inline]
    fn apply_weight(&self, weight: &Self) -> Self {
        self * weight
    }

    #[inline]
    fn merge_weighted(&self, weight: &Self, other: &Self, other_weight: &Self) -> Self {
        self * weight + other * other_weight
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn integer_weights_wrap() {
        assert_eq!(7i32.apply_weight(&3), 21);
        assert_eq!(2i32.merge_weighted(&3, &4, &5), 26);
        assert_eq!(u32::MAX.apply_weight(&2), u32::MAX - 1);
        assert_eq!(i64::MAX.merge_weighted(&1, &1, &1), i64::MIN);
    }

    #[test]
    fn float_weights() {
        assert!((1.5f32.apply_weight(&2.0) - 3.0).abs() < f32::EPSILON);
        assert!((1.0f32.merge_weighted(&0.5, &2.0, &0.25) - 1.0).abs() < f32::EPSILON);
        assert!((<f32 as WeightedValue>::IDENTITY - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn bucket_sizes_depend_on_value_kind() {
        assert_eq!(<u32 as KeyType>::bucket_size_for::<u32>(), 120);
        assert_eq!(<u32 as KeyType>::bucket_size_for::<f32>(), 120);
        assert_eq!(<u32 as KeyType>::bucket_size_for::<super::super::Object>(), 60);
    }
}
