// Copyright 2026 The Polaris Project
// SPDX-License-Identifier: BSD-3-Clause

pub mod subnet_rotation;

pub use subnet_rotation::SubnetRotationTask;
