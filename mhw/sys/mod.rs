// Copyright 2025 Google
// SPDX-License-Identifier: MIT

#[cfg(any(target_os = "android", target_os = "linux"))]
pub mod linux;

#[cfg(not(any(target_os = "android", target_os = "linux")))]
pub mod generic;

cfg_if::cfg_if! {
    if #[cfg(any(target_os = "android", target_os = "linux"))] {
        pub use linux as platform;
    } else {
        pub use generic as platform;
    }
}
