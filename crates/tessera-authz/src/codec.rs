//! Serialization codec between the on-token permission claims and the
//! normalized [`DecodedPermissions`] form.
//!
//! # Purpose
//! Decodes any of the three claim generations into one shape, and encodes
//! the two compact generations for token issuance.
//!
//! # How it fits
//! The authorization engine calls [`PermissionCodec::decode`] once per
//! check; token issuers call the `encode_*` methods when minting.
//!
//! # Key invariants
//! - Unknown permission codes decode to themselves as opaque literals; they
//!   are never an error (forward compatibility across catalog versions).
//! - Generation B references concatenate single-character segment codes and
//!   fall back to `.`-joined codes as soon as any code is longer; decode
//!   picks the split strategy from the presence of a literal `.`.
//! - Delimiters (`;`, `|`, `~`, `.`) never occur inside encoded output;
//!   the alphabet constructor enforces this.
use crate::alphabet::AlphabetEncoder;
use crate::catalog::Catalog;
use crate::claims::{
    DecodedPermissions, DictionaryClaim, PermissionsClaim, UncompressedClaim, UncompressedStudy,
    VeryCompactClaim,
};
use crate::{AuthzError, AuthzResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Codec over one catalog and one alphabet.
///
/// The encoder must be the same one the catalog's code index was built
/// with; [`PermissionCodec::new`] pairs the shared catalog with the
/// standard extended alphabet.
pub struct PermissionCodec {
    catalog: Arc<Catalog>,
    encoder: AlphabetEncoder,
}

impl PermissionCodec {
    /// Codec over the given catalog and the standard extended alphabet.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            encoder: AlphabetEncoder::extended(),
        }
    }

    /// Codec over an explicit catalog/encoder pair. The caller is
    /// responsible for building the catalog with the same encoder.
    pub fn with_encoder(catalog: Arc<Catalog>, encoder: AlphabetEncoder) -> Self {
        Self { catalog, encoder }
    }

    /// Decode any claim generation into the normalized form.
    pub fn decode(&self, claim: &PermissionsClaim) -> AuthzResult<DecodedPermissions> {
        match claim {
            PermissionsClaim::VeryCompact(body) => self.decode_very_compact(body),
            PermissionsClaim::DictionaryCompact(body) => self.decode_dictionary(body),
            PermissionsClaim::Uncompressed(body) => Ok(Self::decode_uncompressed(body)),
        }
    }

    // ---- generation A ------------------------------------------------

    fn decode_very_compact(&self, body: &VeryCompactClaim) -> AuthzResult<DecodedPermissions> {
        let mut decoded = DecodedPermissions::default();
        for token in split_nonempty(&body.globals, ';') {
            decoded.globals.insert(self.decode_coded_permission(token));
        }
        for entry in split_nonempty(&body.activities, '|') {
            let (study_id, encoded_activities) = self.split_study_entry(entry)?;
            let activities = encoded_activities
                .iter()
                .map(|token| self.decode_coded_permission(token))
                .collect();
            decoded.push_study(study_id, activities);
        }
        Ok(decoded)
    }

    /// A generation-A permission token is either an encoded catalog code or,
    /// as a back-compat escape hatch, a literal dotted name. Codes the
    /// catalog does not know stay opaque.
    fn decode_coded_permission(&self, token: &str) -> String {
        self.catalog
            .lookup_by_code(token)
            .map(|permission| permission.name.to_string())
            .unwrap_or_else(|| token.to_string())
    }

    /// Encode normalized permissions as a generation-A claim body.
    ///
    /// Names absent from the catalog are carried literally, which is legal
    /// on the wire because real names always contain a `.`.
    pub fn encode_very_compact(
        &self,
        permissions: &DecodedPermissions,
    ) -> AuthzResult<VeryCompactClaim> {
        let globals = permissions
            .globals
            .iter()
            .map(|name| self.encode_coded_permission(name))
            .collect::<Vec<_>>()
            .join(";");

        let mut entries = Vec::with_capacity(permissions.studies.len());
        for grant in &permissions.studies {
            let mut entry = self.encoder.encode(study_id_to_wire(grant.study_id)?);
            if !grant.activities.is_empty() {
                entry.push('~');
                entry.push_str(
                    &grant
                        .activities
                        .iter()
                        .map(|name| self.encode_coded_permission(name))
                        .collect::<Vec<_>>()
                        .join(";"),
                );
            }
            entries.push(entry);
        }

        Ok(VeryCompactClaim {
            globals,
            activities: entries.join("|"),
        })
    }

    fn encode_coded_permission(&self, name: &str) -> String {
        self.catalog
            .lookup_by_name(name)
            .map(|permission| self.encoder.encode(u64::from(permission.code)))
            .unwrap_or_else(|| name.to_string())
    }

    // ---- generation B ------------------------------------------------

    fn decode_dictionary(&self, body: &DictionaryClaim) -> AuthzResult<DecodedPermissions> {
        // Per-token dictionary: the i-th segment is referenced on the wire
        // by the encoded form of i.
        let code_to_segment: HashMap<String, &str> = split_nonempty(&body.dictionary, ';')
            .enumerate()
            .map(|(index, segment)| (self.encoder.encode(index as u64), segment))
            .collect();

        let mut decoded = DecodedPermissions::default();
        for token in split_nonempty(&body.globals, ';') {
            decoded
                .globals
                .insert(decode_segmented_permission(token, &code_to_segment));
        }
        for entry in split_nonempty(&body.activities, '|') {
            let (study_id, encoded_activities) = self.split_study_entry(entry)?;
            let activities = encoded_activities
                .iter()
                .map(|token| decode_segmented_permission(token, &code_to_segment))
                .collect();
            decoded.push_study(study_id, activities);
        }
        Ok(decoded)
    }

    /// Encode normalized permissions as a generation-B claim body, building
    /// the segment dictionary from the names actually used, in first-seen
    /// order.
    pub fn encode_dictionary(
        &self,
        permissions: &DecodedPermissions,
    ) -> AuthzResult<DictionaryClaim> {
        let mut dictionary: Vec<&str> = Vec::new();
        let mut index_of: HashMap<&str, usize> = HashMap::new();
        let all_names = permissions
            .globals
            .iter()
            .chain(permissions.studies.iter().flat_map(|g| g.activities.iter()));
        for name in all_names {
            for segment in name.split('.') {
                if !index_of.contains_key(segment) {
                    index_of.insert(segment, dictionary.len());
                    dictionary.push(segment);
                }
            }
        }

        let globals = permissions
            .globals
            .iter()
            .map(|name| self.encode_segmented_permission(name, &index_of))
            .collect::<Vec<_>>()
            .join(";");

        let mut entries = Vec::with_capacity(permissions.studies.len());
        for grant in &permissions.studies {
            let mut entry = self.encoder.encode(study_id_to_wire(grant.study_id)?);
            if !grant.activities.is_empty() {
                entry.push('~');
                entry.push_str(
                    &grant
                        .activities
                        .iter()
                        .map(|name| self.encode_segmented_permission(name, &index_of))
                        .collect::<Vec<_>>()
                        .join(";"),
                );
            }
            entries.push(entry);
        }

        Ok(DictionaryClaim {
            dictionary: dictionary.join(";"),
            globals,
            activities: entries.join("|"),
        })
    }

    fn encode_segmented_permission(&self, name: &str, index_of: &HashMap<&str, usize>) -> String {
        let codes: Vec<String> = name
            .split('.')
            .map(|segment| self.encoder.encode(index_of[segment] as u64))
            .collect();
        // Dots are only needed once some segment code grows past one
        // character; otherwise the codes pack tighter without them.
        if codes.iter().all(|code| code.chars().count() == 1) {
            codes.concat()
        } else {
            codes.join(".")
        }
    }

    // ---- uncompressed legacy -----------------------------------------

    fn decode_uncompressed(body: &UncompressedClaim) -> DecodedPermissions {
        let mut decoded = DecodedPermissions {
            globals: body.globals.iter().cloned().collect(),
            studies: Vec::new(),
        };
        for study in &body.activities {
            decoded.push_study(study.study_id, study.activities.iter().cloned().collect());
        }
        decoded
    }

    /// Encode normalized permissions as the uncompressed legacy body.
    pub fn encode_uncompressed(permissions: &DecodedPermissions) -> UncompressedClaim {
        UncompressedClaim {
            globals: permissions.globals.iter().cloned().collect(),
            activities: permissions
                .studies
                .iter()
                .map(|grant| UncompressedStudy {
                    study_id: grant.study_id,
                    activities: grant.activities.iter().cloned().collect(),
                })
                .collect(),
        }
    }

    // ---- shared helpers ----------------------------------------------

    /// Split one `encodedStudyId[~perm;...]` entry. A missing `~` means the
    /// study is mentioned with an empty activity set.
    ///
    /// Only the first `~` delimits; a stray second `~` stays inside a
    /// permission token, which then degrades to an opaque literal like any
    /// other unrecognized token. No issuer mints such entries.
    fn split_study_entry<'e>(&self, entry: &'e str) -> AuthzResult<(i64, Vec<&'e str>)> {
        let (encoded_id, rest) = match entry.split_once('~') {
            Some((encoded_id, rest)) => (encoded_id, Some(rest)),
            None => (entry, None),
        };
        let study_id = wire_to_study_id(self.encoder.decode(encoded_id)?, entry)?;
        let activities = rest
            .map(|encoded| split_nonempty(encoded, ';').collect())
            .unwrap_or_default();
        Ok((study_id, activities))
    }
}

/// Decode one generation-B permission reference against the per-token
/// dictionary. Dotted references split on `.`; undotted ones split into
/// single characters. Codes missing from the dictionary stay opaque.
fn decode_segmented_permission(encoded: &str, code_to_segment: &HashMap<String, &str>) -> String {
    let lookup = |code: &str| {
        code_to_segment
            .get(code)
            .map(|segment| segment.to_string())
            .unwrap_or_else(|| code.to_string())
    };
    if encoded.contains('.') {
        encoded
            .split('.')
            .map(lookup)
            .collect::<Vec<_>>()
            .join(".")
    } else {
        encoded
            .chars()
            .map(|ch| lookup(&ch.to_string()))
            .collect::<Vec<_>>()
            .join(".")
    }
}

fn split_nonempty(text: &str, separator: char) -> impl Iterator<Item = &str> {
    text.split(separator).filter(|token| !token.is_empty())
}

fn study_id_to_wire(study_id: i64) -> AuthzResult<u64> {
    u64::try_from(study_id)
        .map_err(|_| AuthzError::MalformedPermissions(format!("negative study id {study_id}")))
}

fn wire_to_study_id(value: u64, entry: &str) -> AuthzResult<i64> {
    i64::try_from(value)
        .map_err(|_| AuthzError::MalformedPermissions(format!("study id out of range in {entry:?}")))
}
