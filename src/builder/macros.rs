//! Macros for declaring marker sequences.

/// Declare a fieldless enum as the marker sequence of a stage.
///
/// Variants are listed in sequence order, each with the name it is known
/// by outside the program. The generated enum implements
/// [`Marker`](crate::core::Marker), `Display` (the marker name) and carries
/// an `ALL` constant with every variant.
///
/// # Example
///
/// ```
/// use hubble_stages::core::Marker;
/// use hubble_stages::marker_enum;
///
/// marker_enum! {
///     stage: "spectra";
///     pub enum SpectraMarker {
///         Meet => "mee_gui1",
///         Select => "sel_gal1",
///         Done => "end_sta1",
///     }
/// }
///
/// assert_eq!(SpectraMarker::Select.name(), "sel_gal1");
/// assert_eq!(SpectraMarker::Done.ordinal(), 2);
/// assert_eq!(SpectraMarker::from_name("mee_gui1"), Some(SpectraMarker::Meet));
/// assert_eq!(SpectraMarker::ALL.len(), 3);
/// assert_eq!(SpectraMarker::STAGE, "spectra");
/// ```
#[macro_export]
macro_rules! marker_enum {
    (
        stage: $stage:literal;
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $label:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            Debug,
            serde::Serialize,
            serde::Deserialize,
        )]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),+
        }

        impl $name {
            /// Every marker, in sequence order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
        }

        impl $crate::core::Marker for $name {
            const STAGE: &'static str = $stage;

            fn all() -> &'static [Self] {
                Self::ALL
            }

            fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }

            fn ordinal(&self) -> u32 {
                *self as u32
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::core::Marker::name(self))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::core::Marker;

    marker_enum! {
        stage: "macro_test";
        enum TestMarker {
            Initial => "ini1",
            Processing => "pro1",
            Complete => "com1",
        }
    }

    #[test]
    fn marker_enum_generates_trait() {
        assert_eq!(TestMarker::STAGE, "macro_test");
        assert_eq!(TestMarker::Initial.name(), "ini1");
        assert_eq!(TestMarker::Complete.ordinal(), 2);
        assert_eq!(TestMarker::all(), TestMarker::ALL);
        assert_eq!(TestMarker::Processing.to_string(), "pro1");
    }

    #[test]
    fn ordinals_follow_declaration_order() {
        for (i, marker) in TestMarker::ALL.iter().enumerate() {
            assert_eq!(marker.ordinal() as usize, i);
            assert_eq!(TestMarker::from_ordinal(i as u32), Some(*marker));
        }
        assert!(TestMarker::Initial < TestMarker::Complete);
    }

    #[test]
    fn marker_enum_supports_visibility_and_attributes() {
        marker_enum! {
            stage: "public";
            /// Documented sequence.
            pub enum PublicMarker {
                /// First.
                A => "a1",
                B => "b1",
            }
        }

        assert_eq!(PublicMarker::last(), PublicMarker::B);
    }

    #[test]
    fn single_marker_sequence_clamps_both_ways() {
        marker_enum! {
            stage: "single";
            enum Only {
                One => "one1"
            }
        }

        assert_eq!(Only::One.next(), Only::One);
        assert_eq!(Only::One.previous(), Only::One);
        assert!(Only::One.is_first() && Only::One.is_last());
    }
}
