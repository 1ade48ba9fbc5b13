// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

mod decoder;
mod options;
mod output;

pub use crate::upsample::ChromaSiting;
pub use decoder::*;
pub use options::*;
pub use output::*;
