//! Wire-level permission claim shapes and the decoded, normalized form.
//!
//! # Purpose
//! Models the three generations of the on-token permission representation
//! and detects, once per decode, which one a parsed claim map carries.
//!
//! # Key invariants
//! - Detection is exhaustive: a claim map resolves to exactly one
//!   [`PermissionsClaim`] variant or to an error; there is no scattered
//!   per-call-site sniffing.
//! - [`DecodedPermissions`] never holds duplicate study ids or duplicate
//!   activity names; decoding the same claims twice yields equal values.
use crate::{AuthzError, AuthzResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Generation A claim body, carried under the `prm` claim key.
///
/// Serialized example: `{"glb":"V0;V1;t5","vcp":"F52|Jfn~60;N5"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VeryCompactClaim {
    /// `;`-joined global permission tokens, each an encoded code or a
    /// literal dotted name.
    #[serde(rename = "glb", default)]
    pub globals: String,
    /// `|`-joined per-study entries, `encodedStudyId[~perm;perm;...]`.
    #[serde(rename = "vcp", default)]
    pub activities: String,
}

/// Generation B claim body, carried under the `permissions` claim key.
///
/// Serialized example:
/// `{"dic":"qc;reading;all","glb":"V0;V1","perms":"F52|Jfn~Kb"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryClaim {
    /// `;`-joined ordered list of name segments referenced by this token.
    #[serde(rename = "dic", default)]
    pub dictionary: String,
    /// `;`-joined global permission references (encoded segment indices).
    #[serde(rename = "glb", default)]
    pub globals: String,
    /// `|`-joined per-study entries in the same shape as generation A, with
    /// permission references encoded against the dictionary.
    #[serde(rename = "perms", default)]
    pub activities: String,
}

/// Fully uncompressed legacy claim body under the `permissions` claim key:
/// plain arrays of names, no codec involved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UncompressedClaim {
    #[serde(default)]
    pub globals: Vec<String>,
    #[serde(default)]
    pub activities: Vec<UncompressedStudy>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UncompressedStudy {
    #[serde(rename = "projectId")]
    pub study_id: i64,
    #[serde(default)]
    pub activities: Vec<String>,
}

/// The permission payload of one token, tagged by serialization generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionsClaim {
    VeryCompact(VeryCompactClaim),
    DictionaryCompact(DictionaryClaim),
    Uncompressed(UncompressedClaim),
}

impl PermissionsClaim {
    /// Detect which generation a parsed claim map carries.
    ///
    /// Dispatch order mirrors the token issuers: a `prm` key (without a
    /// competing `permissions` key) is generation A; a `permissions` object
    /// holding `dic`/`perms`/`glb` strings is generation B; a `permissions`
    /// object holding plain arrays is the uncompressed legacy shape.
    ///
    /// # Errors
    /// - [`AuthzError::NotAuthenticated`] when neither claim key is present.
    /// - [`AuthzError::MalformedPermissions`] when a claim key is present
    ///   but its body does not deserialize to the detected shape.
    pub fn detect(claims: &Map<String, Value>) -> AuthzResult<Self> {
        if let Some(prm) = claims.get("prm") {
            if !claims.contains_key("permissions") {
                let claim = from_claim_value(prm)?;
                return Ok(Self::VeryCompact(claim));
            }
        }

        let Some(permissions) = claims.get("permissions") else {
            return Err(AuthzError::NotAuthenticated);
        };
        let Some(body) = permissions.as_object() else {
            return Err(AuthzError::MalformedPermissions(
                "permissions claim is not an object".to_string(),
            ));
        };

        if body.contains_key("dic") || body.contains_key("perms") || body.contains_key("glb") {
            Ok(Self::DictionaryCompact(from_claim_value(permissions)?))
        } else {
            Ok(Self::Uncompressed(from_claim_value(permissions)?))
        }
    }

    /// The top-level claim key this generation is stored under.
    pub fn claim_key(&self) -> &'static str {
        match self {
            Self::VeryCompact(_) => "prm",
            Self::DictionaryCompact(_) | Self::Uncompressed(_) => "permissions",
        }
    }
}

fn from_claim_value<T: serde::de::DeserializeOwned>(value: &Value) -> AuthzResult<T> {
    serde_json::from_value(value.clone())
        .map_err(|err| AuthzError::MalformedPermissions(err.to_string()))
}

/// One study's decoded permission grants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudyGrant {
    pub study_id: i64,
    pub activities: BTreeSet<String>,
}

/// The normalized permission data of one token, shared by all generations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedPermissions {
    pub globals: BTreeSet<String>,
    pub studies: Vec<StudyGrant>,
}

impl DecodedPermissions {
    /// The grant entry for one study, if the token mentions it at all.
    pub fn study(&self, study_id: i64) -> Option<&StudyGrant> {
        self.studies.iter().find(|grant| grant.study_id == study_id)
    }

    /// Append a study grant, merging into an existing entry so study ids
    /// stay unique. Wire order of first appearance is preserved.
    pub(crate) fn push_study(&mut self, study_id: i64, activities: BTreeSet<String>) {
        match self
            .studies
            .iter_mut()
            .find(|grant| grant.study_id == study_id)
        {
            Some(existing) => existing.activities.extend(activities),
            None => self.studies.push(StudyGrant {
                study_id,
                activities,
            }),
        }
    }
}
