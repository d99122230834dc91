//! The permission catalog: the single source of truth binding permission
//! names to their compact wire codes.
//!
//! # Purpose
//! Maps dot-namespaced permission names to small stable integer codes and
//! back, so tokens can carry a two-character code instead of a thirty
//! character name.
//!
//! # Key invariants
//! - Codes are never reused; a published permission is immutable.
//! - Deprecated permissions live in a disjoint block at codes >= 10_000 so
//!   they can never collide with active low codes.
//! - The code index is keyed by the *alphabet-encoded* code string, which is
//!   exactly what appears inside a token.
//! - Unknown codes resolve to `None`, never an error; an old service must
//!   tolerate tokens minted against a newer catalog.
use crate::alphabet::AlphabetEncoder;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;

/// A single published permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Permission {
    pub name: &'static str,
    pub code: u32,
    pub deprecated: bool,
}

impl Permission {
    const fn active(name: &'static str, code: u32) -> Self {
        Self {
            name,
            code,
            deprecated: false,
        }
    }

    const fn legacy(name: &'static str, code: u32) -> Self {
        Self {
            name,
            code,
            deprecated: true,
        }
    }
}

impl Permission {
    pub const CONFIGURATION_STUDY_DELETE: Permission =
        Permission::active("configuration.study.delete", 0);
    pub const CONFIGURATION_STUDY_EDIT: Permission =
        Permission::active("configuration.study.edit", 1);
    pub const CONFIGURATION_STUDY_CREATE: Permission =
        Permission::active("configuration.study.create", 2);
    pub const CONFIGURATION_SITE_CREATE: Permission =
        Permission::active("configuration.site.create", 3);
    pub const CONFIGURATION_SITE_DELETE: Permission =
        Permission::active("configuration.site.delete", 4);
    pub const CONFIGURATION_SITE_EDIT: Permission =
        Permission::active("configuration.site.edit", 5);
    pub const CONFIGURATION_USER_DEACTIVATE: Permission =
        Permission::active("configuration.user.deactivate", 6);
    pub const CONFIGURATION_USER_DELETE: Permission =
        Permission::active("configuration.user.delete", 7);
    pub const CONFIGURATION_IMAGING_DELETE: Permission =
        Permission::active("configuration.imaging.delete", 8);
    pub const CONFIGURATION_READING_CREATE: Permission =
        Permission::active("configuration.reading.create", 9);
    pub const CONFIGURATION_IMAGING_CREATE: Permission =
        Permission::active("configuration.imaging.create", 10);
    pub const CONFIGURATION_IMAGING_EDIT: Permission =
        Permission::active("configuration.imaging.edit", 11);
    pub const CONFIGURATION_READING_EDIT: Permission =
        Permission::active("configuration.reading.edit", 12);
    pub const CONFIGURATION_READING_DELETE: Permission =
        Permission::active("configuration.reading.delete", 13);
    pub const UPLOAD_VIEW_ALL_SITE_DATA: Permission =
        Permission::active("upload.view.all.site.data", 14);
    pub const UPLOAD_DATA: Permission = Permission::active("upload.data", 15);
    pub const UPLOAD_CREATE_OR_UPLOAD_EDTF: Permission =
        Permission::active("upload.create.or.upload.eDTF", 16);
    pub const UPLOAD_CREATE_PATIENT: Permission =
        Permission::active("upload.create.patient", 17);
    pub const QC_VIEW_ALL_UPLOADED_DATA: Permission =
        Permission::active("qc.view.all.uploaded.data", 18);
    pub const QC_SELECT_UPLOADED_VISIT: Permission =
        Permission::active("qc.select.uploaded.visit", 19);
    pub const UPLOAD_VIEW_EDTF: Permission = Permission::active("upload.view.eDTF", 20);
    pub const QC_VIEW_RESULTS: Permission = Permission::active("qc.view.results", 21);
    pub const READER_CENTRAL: Permission = Permission::active("reader.central", 22);
    pub const CONFIGURATION_SPONSOR_CREATE: Permission =
        Permission::active("configuration.sponsor.create", 23);
    pub const CONFIGURATION_SPONSOR_EDIT: Permission =
        Permission::active("configuration.sponsor.edit", 24);
    pub const CONFIGURATION_SPONSOR_DELETE: Permission =
        Permission::active("configuration.sponsor.delete", 25);
    pub const CONFIGURATION_USER_EDIT: Permission =
        Permission::active("configuration.user.edit", 26);
    pub const CONFIGURATION_USER_CREATE: Permission =
        Permission::active("configuration.user.create", 27);
    pub const CONFIGURATION_SCANNER_CREATE: Permission =
        Permission::active("configuration.scanner.create", 28);
    pub const CONFIGURATION_SCANNER_EDIT: Permission =
        Permission::active("configuration.scanner.edit", 29);
    pub const CONFIGURATION_SCANNER_DELETE: Permission =
        Permission::active("configuration.scanner.delete", 30);
    pub const QUERIES_UPDATE_EDCF: Permission = Permission::active("queries.update.eDCF", 31);
    pub const QUERIES_VIEW_EDCF: Permission = Permission::active("queries.view.eDCF", 32);
    pub const QUERIES_RESOLVE_EDCF: Permission =
        Permission::active("queries.resolve.eDCF", 33);
    pub const QUERIES_CREATE_EDCF: Permission = Permission::active("queries.create.eDCF", 34);
    pub const CONFIGURATION_UPLOAD_VIEW_ALL_SITE_DATA: Permission =
        Permission::active("configuration.upload.view.all.site.data", 35);
    pub const UPLOAD_PATIENT_DISCONTINUED: Permission =
        Permission::active("upload.patient.discontinued", 36);
    pub const READER_DX_KL: Permission = Permission::active("reader.dx.kl", 37);
    pub const READER_MRI_IF: Permission = Permission::active("reader.mri.if", 38);
    pub const READER_WB_MRI_IF: Permission = Permission::active("reader.wb-mri.if", 39);
    pub const READER_DCE_MRI_IF: Permission = Permission::active("reader.dce-mri.if", 40);
    pub const READER_DX_IF: Permission = Permission::active("reader.dx.if", 41);
    pub const CONFIGURATION_UPLOAD_EDIT: Permission =
        Permission::active("configuration.upload.edit", 42);
    pub const CONFIGURATION_STUDY_OVERALL_VIEWER: Permission =
        Permission::active("configuration.study.overall.viewer", 43);
    pub const QC_CREATE_EDCF: Permission = Permission::active("qc.create.eDCF", 44);
    pub const DASHBOARD_LIST_BATCHES: Permission =
        Permission::active("dashboard.list.batches", 45);
    pub const DASHBOARD_READ_DETAILS_BATCH: Permission =
        Permission::active("dashboard.read-details.batch", 46);
    pub const DASHBOARD_READ_DETAILS_READING: Permission =
        Permission::active("dashboard.read-details.reading", 47);
    pub const DASHBOARD_CREATE_EDIT_READING: Permission =
        Permission::active("dashboard.create-edit.reading", 48);
    pub const DASHBOARD_CREATE_EDIT_BATCH: Permission =
        Permission::active("dashboard.create-edit.batch", 49);
    pub const DASHBOARD_LIST_PROJECTS: Permission =
        Permission::active("dashboard.list.projects", 50);
    pub const DASHBOARD_ACCESS: Permission = Permission::active("dashboard.access", 51);
    pub const DASHBOARD_ACCESS_SPONSOR: Permission =
        Permission::active("dashboard.access.sponsor", 52);
    pub const CLINICAL_TRIAL_ACCESS: Permission =
        Permission::active("clinicaltrial.access", 53);
    pub const AUDIT_TRAILS_ACCESS: Permission = Permission::active("audittrails.access", 54);
    pub const DASHBOARD_LIST_READINGS: Permission =
        Permission::active("dashboard.list.readings", 55);

    // Retired webinar block. Codes stay reserved so they are never reissued.
    pub const WEBINAR_ADD_PROJECT: Permission =
        Permission::legacy("webinar.add.project", 10_000);
    pub const WEBINAR_PROJECT_CREATE: Permission =
        Permission::legacy("webinar.project.create", 10_001);
    pub const WEBINAR_PROJECT_LIST: Permission =
        Permission::legacy("webinar.project.list", 10_002);
    pub const WEBINAR_PROJECT_DELETE: Permission =
        Permission::legacy("webinar.project.delete", 10_003);
    pub const WEBINAR_PROJECT_EDIT: Permission =
        Permission::legacy("webinar.project.edit", 10_004);
    pub const WEBINAR_QUESTION_LIST: Permission =
        Permission::legacy("webinar.question.list", 10_005);
    pub const WEBINAR_QUESTION_GET: Permission =
        Permission::legacy("webinar.question.get", 10_006);
    pub const WEBINAR_QUESTION_CREATE: Permission =
        Permission::legacy("webinar.question.create", 10_007);
    pub const WEBINAR_QUESTION_EDIT: Permission =
        Permission::legacy("webinar.question.edit", 10_008);
    pub const WEBINAR_QUESTION_DELETE: Permission =
        Permission::legacy("webinar.question.delete", 10_009);
    pub const WEBINAR_ANSWER_LIST: Permission =
        Permission::legacy("webinar.answer.list", 10_010);
    pub const WEBINAR_ANSWER_GET: Permission =
        Permission::legacy("webinar.answer.get", 10_011);
    pub const WEBINAR_ANSWER_CREATE: Permission =
        Permission::legacy("webinar.answer.create", 10_012);
    pub const WEBINAR_ANSWER_EDIT: Permission =
        Permission::legacy("webinar.answer.edit", 10_013);
    pub const WEBINAR_ANSWER_DELETE: Permission =
        Permission::legacy("webinar.answer.delete", 10_014);
    pub const WEBINAR_QUESTION_ADMIN: Permission =
        Permission::legacy("webinar.question.admin", 10_015);
    pub const WEBINAR_QUESTION_ATTACH: Permission =
        Permission::legacy("webinar.question.attach", 10_016);
    pub const WEBINAR_DASHBOARD_GET: Permission =
        Permission::legacy("webinar.dashboard.get", 10_017);
    pub const WEBINAR_REPORT_CREATE: Permission =
        Permission::legacy("webinar.report.create", 10_018);
    pub const WEBINAR_REPORT_GET: Permission =
        Permission::legacy("webinar.report.get", 10_019);
    pub const WEBINAR_DESCRIPTION_CREATE: Permission =
        Permission::legacy("webinar.description.create", 10_020);
    pub const WEBINAR_DESCRIPTION_DELETE: Permission =
        Permission::legacy("webinar.description.delete", 10_021);
    pub const WEBINAR_DESCRIPTION_GET: Permission =
        Permission::legacy("webinar.description.get", 10_022);
    pub const WEBINAR_DESCRIPTION_EDIT: Permission =
        Permission::legacy("webinar.description.edit", 10_023);

    /// Every published permission, active and deprecated.
    pub const ALL: &'static [Permission] = &[
        Self::CONFIGURATION_STUDY_DELETE,
        Self::CONFIGURATION_STUDY_EDIT,
        Self::CONFIGURATION_STUDY_CREATE,
        Self::CONFIGURATION_SITE_CREATE,
        Self::CONFIGURATION_SITE_DELETE,
        Self::CONFIGURATION_SITE_EDIT,
        Self::CONFIGURATION_USER_DEACTIVATE,
        Self::CONFIGURATION_USER_DELETE,
        Self::CONFIGURATION_IMAGING_DELETE,
        Self::CONFIGURATION_READING_CREATE,
        Self::CONFIGURATION_IMAGING_CREATE,
        Self::CONFIGURATION_IMAGING_EDIT,
        Self::CONFIGURATION_READING_EDIT,
        Self::CONFIGURATION_READING_DELETE,
        Self::UPLOAD_VIEW_ALL_SITE_DATA,
        Self::UPLOAD_DATA,
        Self::UPLOAD_CREATE_OR_UPLOAD_EDTF,
        Self::UPLOAD_CREATE_PATIENT,
        Self::QC_VIEW_ALL_UPLOADED_DATA,
        Self::QC_SELECT_UPLOADED_VISIT,
        Self::UPLOAD_VIEW_EDTF,
        Self::QC_VIEW_RESULTS,
        Self::READER_CENTRAL,
        Self::CONFIGURATION_SPONSOR_CREATE,
        Self::CONFIGURATION_SPONSOR_EDIT,
        Self::CONFIGURATION_SPONSOR_DELETE,
        Self::CONFIGURATION_USER_EDIT,
        Self::CONFIGURATION_USER_CREATE,
        Self::CONFIGURATION_SCANNER_CREATE,
        Self::CONFIGURATION_SCANNER_EDIT,
        Self::CONFIGURATION_SCANNER_DELETE,
        Self::QUERIES_UPDATE_EDCF,
        Self::QUERIES_VIEW_EDCF,
        Self::QUERIES_RESOLVE_EDCF,
        Self::QUERIES_CREATE_EDCF,
        Self::CONFIGURATION_UPLOAD_VIEW_ALL_SITE_DATA,
        Self::UPLOAD_PATIENT_DISCONTINUED,
        Self::READER_DX_KL,
        Self::READER_MRI_IF,
        Self::READER_WB_MRI_IF,
        Self::READER_DCE_MRI_IF,
        Self::READER_DX_IF,
        Self::CONFIGURATION_UPLOAD_EDIT,
        Self::CONFIGURATION_STUDY_OVERALL_VIEWER,
        Self::QC_CREATE_EDCF,
        Self::DASHBOARD_LIST_BATCHES,
        Self::DASHBOARD_READ_DETAILS_BATCH,
        Self::DASHBOARD_READ_DETAILS_READING,
        Self::DASHBOARD_CREATE_EDIT_READING,
        Self::DASHBOARD_CREATE_EDIT_BATCH,
        Self::DASHBOARD_LIST_PROJECTS,
        Self::DASHBOARD_ACCESS,
        Self::DASHBOARD_ACCESS_SPONSOR,
        Self::CLINICAL_TRIAL_ACCESS,
        Self::AUDIT_TRAILS_ACCESS,
        Self::DASHBOARD_LIST_READINGS,
        Self::WEBINAR_ADD_PROJECT,
        Self::WEBINAR_PROJECT_CREATE,
        Self::WEBINAR_PROJECT_LIST,
        Self::WEBINAR_PROJECT_DELETE,
        Self::WEBINAR_PROJECT_EDIT,
        Self::WEBINAR_QUESTION_LIST,
        Self::WEBINAR_QUESTION_GET,
        Self::WEBINAR_QUESTION_CREATE,
        Self::WEBINAR_QUESTION_EDIT,
        Self::WEBINAR_QUESTION_DELETE,
        Self::WEBINAR_ANSWER_LIST,
        Self::WEBINAR_ANSWER_GET,
        Self::WEBINAR_ANSWER_CREATE,
        Self::WEBINAR_ANSWER_EDIT,
        Self::WEBINAR_ANSWER_DELETE,
        Self::WEBINAR_QUESTION_ADMIN,
        Self::WEBINAR_QUESTION_ATTACH,
        Self::WEBINAR_DASHBOARD_GET,
        Self::WEBINAR_REPORT_CREATE,
        Self::WEBINAR_REPORT_GET,
        Self::WEBINAR_DESCRIPTION_CREATE,
        Self::WEBINAR_DESCRIPTION_DELETE,
        Self::WEBINAR_DESCRIPTION_GET,
        Self::WEBINAR_DESCRIPTION_EDIT,
    ];
}

/// Immutable reverse indices over the published permissions.
///
/// Built once per process (see [`Catalog::shared`]) and read concurrently
/// without locking thereafter.
pub struct Catalog {
    by_encoded_code: HashMap<String, Permission>,
    by_name: HashMap<&'static str, Permission>,
}

impl Catalog {
    /// Build a catalog over the full built-in permission set.
    pub fn built_in() -> Self {
        Self::from_permissions(Permission::ALL)
    }

    /// Build a catalog over an explicit permission slice. Used by tests and
    /// by services that only ship a subset of the catalog.
    pub fn from_permissions(permissions: &[Permission]) -> Self {
        let encoder = AlphabetEncoder::extended();
        let mut by_encoded_code = HashMap::with_capacity(permissions.len());
        let mut by_name = HashMap::with_capacity(permissions.len());
        for permission in permissions {
            by_encoded_code.insert(encoder.encode(u64::from(permission.code)), *permission);
            by_name.insert(permission.name, *permission);
        }
        Self {
            by_encoded_code,
            by_name,
        }
    }

    /// The process-wide catalog, initialized on first use.
    pub fn shared() -> Arc<Catalog> {
        static SHARED: Lazy<Arc<Catalog>> = Lazy::new(|| Arc::new(Catalog::built_in()));
        Arc::clone(&SHARED)
    }

    /// Look a permission up by the alphabet-encoded form of its code, i.e.
    /// the exact string that appears inside a compact token.
    pub fn lookup_by_code(&self, encoded: &str) -> Option<Permission> {
        self.by_encoded_code.get(encoded).copied()
    }

    /// Look a permission up by its exact dotted name.
    pub fn lookup_by_name(&self, name: &str) -> Option<Permission> {
        self.by_name.get(name).copied()
    }

    /// Number of published permissions.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_permission_is_indexed_both_ways() {
        let catalog = Catalog::built_in();
        let encoder = AlphabetEncoder::extended();
        for permission in Permission::ALL {
            let encoded = encoder.encode(u64::from(permission.code));
            assert_eq!(catalog.lookup_by_code(&encoded), Some(*permission));
            assert_eq!(catalog.lookup_by_name(permission.name), Some(*permission));
        }
    }

    #[test]
    fn codes_and_names_are_unique() {
        let catalog = Catalog::built_in();
        assert_eq!(catalog.len(), Permission::ALL.len());
        assert_eq!(
            Permission::ALL.len(),
            Permission::ALL
                .iter()
                .map(|p| p.code)
                .collect::<std::collections::HashSet<_>>()
                .len()
        );
    }

    #[test]
    fn deprecated_permissions_live_in_the_high_block() {
        for permission in Permission::ALL {
            if permission.deprecated {
                assert!(permission.code >= 10_000, "{}", permission.name);
            } else {
                assert!(permission.code < 10_000, "{}", permission.name);
            }
        }
    }

    #[test]
    fn unknown_code_is_none_not_an_error() {
        let catalog = Catalog::built_in();
        let encoder = AlphabetEncoder::extended();
        // Code 9_999 sits between the active and deprecated blocks and is
        // not published.
        assert_eq!(catalog.lookup_by_code(&encoder.encode(9_999)), None);
        assert_eq!(catalog.lookup_by_name("no.such.permission"), None);
    }

    #[test]
    fn shared_catalog_is_the_same_instance() {
        let first = Catalog::shared();
        let second = Catalog::shared();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
