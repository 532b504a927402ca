// Copyright 2025 Google
// SPDX-License-Identifier: BSD-3-Clause

/// Performs a checked `+`, `-` or `*` on two integer bindings, yielding
/// `RenderHalError::CheckedArithmetic` on overflow.
#[macro_export]
macro_rules! checked_arithmetic {
    ($x:ident + $y:ident) => {
        $x.checked_add($y)
            .ok_or($crate::RenderHalError::CheckedArithmetic(concat!(
                stringify!($x),
                " + ",
                stringify!($y)
            )))
    };
    ($x:ident - $y:ident) => {
        $x.checked_sub($y)
            .ok_or($crate::RenderHalError::CheckedArithmetic(concat!(
                stringify!($x),
                " - ",
                stringify!($y)
            )))
    };
    ($x:ident * $y:ident) => {
        $x.checked_mul($y)
            .ok_or($crate::RenderHalError::CheckedArithmetic(concat!(
                stringify!($x),
                " * ",
                stringify!($y)
            )))
    };
}

#[cfg(test)]
mod tests {
    use crate::*;

    #[test]
    fn test_checked_arithmetic() {
        let a: u32 = u32::MAX;
        let b: u32 = 1;
        assert!(matches!(
            checked_arithmetic!(a + b),
            Err(RenderHalError::CheckedArithmetic("a + b"))
        ));
        assert_eq!(checked_arithmetic!(b - b).unwrap(), 0);
        assert!(checked_arithmetic!(b - a).is_err());
        assert_eq!(checked_arithmetic!(b * b).unwrap(), 1);
    }
}
