//! Helper macro for declaring port error enums.
//!
//! Generates a `thiserror` enum plus snake_case constructor functions whose
//! parameters accept `impl Into<FieldType>`, so adapters can pass `&str`
//! for `String` fields without ceremony.

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            ::paste::paste! {
                $(
                    pub fn [<$variant:snake>]($($($field: impl Into<$ty>),*)?) -> Self {
                        Self::$variant $( { $($field: $field.into()),* } )?
                    }
                )*
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    define_port_error! {
        pub enum SamplePortError {
            Broken { message: String } => "broken: {message}",
            Counted { count: u32 } => "counted: {count}",
            Flat => "flat failure",
        }
    }

    #[test]
    fn constructors_accept_str_for_string_fields() {
        let err = SamplePortError::broken("wires crossed");
        assert_eq!(err.to_string(), "broken: wires crossed");
    }

    #[test]
    fn constructors_preserve_non_string_types() {
        let err = SamplePortError::counted(3_u32);
        assert_eq!(err.to_string(), "counted: 3");
    }

    #[test]
    fn unit_variants_get_argument_free_constructors() {
        assert_eq!(SamplePortError::flat().to_string(), "flat failure");
    }
}
