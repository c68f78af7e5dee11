// Copyright 2026 Heliport Team.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Unit-tagged compute and storage quantities.
//!
//! Container records carry CPU and memory values with an explicit unit tag;
//! this module converts them to the native Kubernetes quantity syntax
//! ("250m", "1", "128Mi", "2Gi") and back.

use crate::shared::error::{EngineError, Result};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CpuUnit {
    Millicores,
    Cores,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryUnit {
    Mebibyte,
    Gibibyte,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuQuantity {
    pub value: u64,
    pub unit: CpuUnit,
}

impl CpuQuantity {
    pub fn new(value: u64, unit: CpuUnit) -> Self {
        Self { value, unit }
    }

    pub fn millicores(value: u64) -> Self {
        Self::new(value, CpuUnit::Millicores)
    }

    pub fn cores(value: u64) -> Self {
        Self::new(value, CpuUnit::Cores)
    }

    /// Native quantity syntax: `"100m"` for millicores, `"1"` for cores.
    pub fn to_native(&self) -> String {
        match self.unit {
            CpuUnit::Millicores => format!("{}m", self.value),
            CpuUnit::Cores => format!("{}", self.value),
        }
    }

    pub fn to_quantity(&self) -> Quantity {
        Quantity(self.to_native())
    }

    pub fn parse(s: &str) -> Result<Self> {
        if let Some(v) = s.strip_suffix('m') {
            let value = v
                .parse()
                .map_err(|_| EngineError::ValidationError(format!("invalid CPU quantity: {s}")))?;
            Ok(Self::millicores(value))
        } else {
            let value = s
                .parse()
                .map_err(|_| EngineError::ValidationError(format!("invalid CPU quantity: {s}")))?;
            Ok(Self::cores(value))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryQuantity {
    pub value: u64,
    pub unit: MemoryUnit,
}

impl MemoryQuantity {
    pub fn new(value: u64, unit: MemoryUnit) -> Self {
        Self { value, unit }
    }

    pub fn mebibytes(value: u64) -> Self {
        Self::new(value, MemoryUnit::Mebibyte)
    }

    pub fn gibibytes(value: u64) -> Self {
        Self::new(value, MemoryUnit::Gibibyte)
    }

    /// Native quantity syntax: `"128Mi"` or `"2Gi"`.
    pub fn to_native(&self) -> String {
        match self.unit {
            MemoryUnit::Mebibyte => format!("{}Mi", self.value),
            MemoryUnit::Gibibyte => format!("{}Gi", self.value),
        }
    }

    pub fn to_quantity(&self) -> Quantity {
        Quantity(self.to_native())
    }

    pub fn parse(s: &str) -> Result<Self> {
        let (digits, unit) = if let Some(v) = s.strip_suffix("Mi") {
            (v, MemoryUnit::Mebibyte)
        } else if let Some(v) = s.strip_suffix("Gi") {
            (v, MemoryUnit::Gibibyte)
        } else {
            return Err(EngineError::ValidationError(format!(
                "invalid memory quantity: {s}"
            )));
        };
        let value = digits
            .parse()
            .map_err(|_| EngineError::ValidationError(format!("invalid memory quantity: {s}")))?;
        Ok(Self::new(value, unit))
    }
}
