//! Interface descriptors and Hardhat artifacts.
//!
//! A descriptor is the set of canonical function signatures a deployed
//! contract exposes. Binding a client checks that every method it calls
//! is present.

use alloy::primitives::Bytes;
use alloy::sol_types::SolCall;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

use crate::contract::abi::EHRManagement;
use crate::error::EhrError;

/// Methods the contract client calls.
pub fn required_signatures() -> [&'static str; 7] {
    [
        EHRManagement::registerPatientCall::SIGNATURE,
        EHRManagement::addRecordCall::SIGNATURE,
        EHRManagement::getPatientRecordsCall::SIGNATURE,
        EHRManagement::getContractBalanceCall::SIGNATURE,
        EHRManagement::depositCall::SIGNATURE,
        EHRManagement::withdrawCall::SIGNATURE,
        EHRManagement::patientCountCall::SIGNATURE,
    ]
}

/// Canonical function signatures a contract exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractInterface {
    functions: BTreeSet<String>,
}

impl ContractInterface {
    /// The interface compiled into this crate.
    pub fn ehr_management() -> Self {
        Self {
            functions: required_signatures().iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Build a descriptor from an explicit list of signatures.
    pub fn from_signatures<I, S>(signatures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            functions: signatures.into_iter().map(Into::into).collect(),
        }
    }

    /// Load the `abi` of a Hardhat artifact.
    pub fn from_artifact(path: &Path) -> Result<Self, EhrError> {
        Ok(Artifact::load(path)?.interface())
    }

    pub fn has(&self, signature: &str) -> bool {
        self.functions.contains(signature)
    }

    /// Required signatures this descriptor lacks.
    pub fn missing(&self) -> Vec<String> {
        required_signatures()
            .iter()
            .filter(|sig| !self.has(sig))
            .map(|sig| sig.to_string())
            .collect()
    }

    pub fn signatures(&self) -> impl Iterator<Item = &str> {
        self.functions.iter().map(String::as_str)
    }
}

/// The parts of a Hardhat compilation artifact this crate reads.
#[derive(Debug, Clone, Deserialize)]
pub struct Artifact {
    #[serde(rename = "contractName", default)]
    pub contract_name: String,
    pub abi: Vec<AbiEntry>,
    /// Creation bytecode as 0x-prefixed hex.
    #[serde(default)]
    pub bytecode: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AbiEntry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AbiParam {
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub components: Vec<AbiParam>,
}

impl AbiParam {
    /// Canonical type, expanding `tuple` into its components.
    fn canonical(&self) -> String {
        match self.ty.strip_prefix("tuple") {
            Some(suffix) => {
                let inner: Vec<String> = self.components.iter().map(AbiParam::canonical).collect();
                format!("({}){}", inner.join(","), suffix)
            }
            None => self.ty.clone(),
        }
    }
}

impl Artifact {
    pub fn load(path: &Path) -> Result<Self, EhrError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EhrError::Artifact(format!("{}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    pub fn parse(json: &str) -> Result<Self, EhrError> {
        serde_json::from_str(json).map_err(|e| EhrError::Artifact(e.to_string()))
    }

    pub fn interface(&self) -> ContractInterface {
        ContractInterface::from_signatures(
            self.abi
                .iter()
                .filter(|entry| entry.kind == "function")
                .map(|entry| {
                    let params: Vec<String> = entry.inputs.iter().map(AbiParam::canonical).collect();
                    format!("{}({})", entry.name, params.join(","))
                }),
        )
    }

    /// Decoded creation bytecode.
    pub fn creation_code(&self) -> Result<Bytes, EhrError> {
        let code: Bytes = self
            .bytecode
            .parse()
            .map_err(|e| EhrError::Artifact(format!("invalid bytecode: {}", e)))?;
        if code.is_empty() {
            return Err(EhrError::Artifact(format!(
                "artifact '{}' has no bytecode (abstract contract or interface?)",
                self.contract_name
            )));
        }
        Ok(code)
    }
}
