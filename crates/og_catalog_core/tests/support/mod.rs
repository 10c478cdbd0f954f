#![allow(dead_code)]

use og_catalog_core::model::control::{
    PrivacyControlDetail, PrivacyControlSummary, ResilienceControl, SdmControlDetail,
    SdmControlProps, SdmControlSummary,
};
use og_catalog_core::model::file::{FileContent, FileDiffResult, FileKey};
use og_catalog_core::model::group::{
    GroupCreateRequest, GroupDeleteRequest, GroupResponse, GroupUpdateRequest, PrivacyGroup,
};
use og_catalog_core::model::mapping::Mapping;
use og_catalog_core::{ApiError, ApiResult, CatalogApi, Versioned};
use serde_json::json;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

/// Backend contents served by [`FakeCatalogApi`].
#[derive(Default)]
pub struct FakeState {
    pub groups: Vec<PrivacyGroup>,
    pub privacy_controls: BTreeMap<String, PrivacyControlDetail>,
    pub resilience_controls: BTreeMap<String, ResilienceControl>,
    pub sdm_controls: BTreeMap<String, SdmControlDetail>,
    pub mappings: BTreeMap<String, Mapping>,
    /// Raw file overrides; the mapping file is rendered from `mappings`
    /// when absent.
    pub files: HashMap<&'static str, String>,
    versions: HashMap<String, u64>,
}

impl FakeState {
    /// Bumps the stored version of a record, as another session saving it
    /// would.
    pub fn touch(&mut self, key: &str) {
        *self.versions.entry(key.to_string()).or_insert(1) += 1;
    }

    fn version(&self, key: &str) -> String {
        format!("\"v{}\"", self.versions.get(key).copied().unwrap_or(1))
    }
}

/// In-memory [`CatalogApi`] with call recording and failure injection.
#[derive(Default)]
pub struct FakeCatalogApi {
    state: RefCell<FakeState>,
    calls: RefCell<Vec<String>>,
    failures: RefCell<HashMap<String, ApiError>>,
    /// Bodies submitted to `save_mapping`, in order.
    pub submitted_mappings: RefCell<Vec<Mapping>>,
}

impl FakeCatalogApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(build: impl FnOnce(&mut FakeState)) -> Self {
        let fake = Self::new();
        build(&mut *fake.state.borrow_mut());
        fake
    }

    pub fn state(&self) -> std::cell::RefMut<'_, FakeState> {
        self.state.borrow_mut()
    }

    /// Makes the next call of `operation` fail with `err`.
    pub fn fail_next(&self, operation: &str, err: ApiError) {
        self.failures.borrow_mut().insert(operation.to_string(), err);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.split(' ').next() == Some(operation))
            .count()
    }

    fn enter(&self, operation: &str, target: &str) -> ApiResult<()> {
        let call = if target.is_empty() {
            operation.to_string()
        } else {
            format!("{operation} {target}")
        };
        self.calls.borrow_mut().push(call);
        match self.failures.borrow_mut().remove(operation) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn check_version(&self, key: &str, expected: Option<&str>) -> ApiResult<()> {
        let current = self.state.borrow().version(key);
        match expected {
            Some(expected) if expected != current => Err(ApiError::Conflict {
                status: 412,
                body: "precondition failed".to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn mapping_file(&self) -> String {
        let state = self.state.borrow();
        let mappings: Vec<_> = state
            .mappings
            .values()
            .map(|mapping| {
                json!({
                    "sdm_control_id": mapping.sdm_control_id,
                    "sdm_title": mapping.sdm_title,
                    "security_controls": mapping
                        .security_controls
                        .iter()
                        .map(|reference| json!({
                            "catalog_id": reference.catalog_id,
                            "control_id": reference.control_id,
                        }))
                        .collect::<Vec<_>>(),
                    "standards": mapping.standards,
                    "notes": mapping.notes,
                })
            })
            .collect();
        json!({ "version": 1, "mappings": mappings }).to_string()
    }
}

impl CatalogApi for FakeCatalogApi {
    fn list_privacy_groups(&self) -> ApiResult<Vec<PrivacyGroup>> {
        self.enter("list_privacy_groups", "")?;
        Ok(self.state.borrow().groups.clone())
    }

    fn create_privacy_group(&self, request: &GroupCreateRequest) -> ApiResult<GroupResponse> {
        self.enter("create_privacy_group", &request.id)?;
        let group = PrivacyGroup {
            id: request.id.clone(),
            title: request.title.clone(),
            description: request.description.clone(),
            control_count: 0,
        };
        self.state.borrow_mut().groups.push(group);
        Ok(GroupResponse {
            id: request.id.clone(),
            title: request.title.clone(),
            description: request.description.clone(),
            control_count: None,
        })
    }

    fn update_privacy_group(
        &self,
        id: &str,
        request: &GroupUpdateRequest,
    ) -> ApiResult<GroupResponse> {
        self.enter("update_privacy_group", id)?;
        let mut state = self.state.borrow_mut();
        let group = state
            .groups
            .iter_mut()
            .find(|group| group.id == id)
            .ok_or_else(|| ApiError::NotFound {
                path: format!("/api/privacy/groups/{id}"),
            })?;
        group.title = request.title.clone();
        group.description = request.description.clone();
        Ok(GroupResponse {
            id: group.id.clone(),
            title: group.title.clone(),
            description: group.description.clone(),
            control_count: None,
        })
    }

    fn delete_privacy_group(&self, id: &str, request: &GroupDeleteRequest) -> ApiResult<()> {
        self.enter("delete_privacy_group", id)?;
        let mut state = self.state.borrow_mut();
        let non_empty = state
            .groups
            .iter()
            .any(|group| group.id == id && group.control_count > 0);
        if non_empty && !request.allow_delete_non_empty {
            return Err(ApiError::Status {
                status: 400,
                body: "group is not empty".to_string(),
            });
        }
        state.groups.retain(|group| group.id != id);
        Ok(())
    }

    fn list_privacy_controls(&self) -> ApiResult<Vec<PrivacyControlSummary>> {
        self.enter("list_privacy_controls", "")?;
        Ok(self
            .state
            .borrow()
            .privacy_controls
            .values()
            .map(PrivacyControlDetail::summary)
            .collect())
    }

    fn get_privacy_control(&self, id: &str) -> ApiResult<Option<Versioned<PrivacyControlDetail>>> {
        self.enter("get_privacy_control", id)?;
        let state = self.state.borrow();
        let key = format!("privacy/{id}");
        Ok(state
            .privacy_controls
            .get(id)
            .map(|control| Versioned::new(control.clone(), Some(state.version(&key)))))
    }

    fn save_privacy_control(
        &self,
        control: &PrivacyControlDetail,
        expected_version: Option<&str>,
    ) -> ApiResult<Versioned<PrivacyControlDetail>> {
        self.enter("save_privacy_control", &control.id)?;
        let key = format!("privacy/{}", control.id);
        self.check_version(&key, expected_version)?;
        let mut state = self.state.borrow_mut();
        let mut canonical = control.clone();
        canonical.title = canonical.title.trim().to_string();
        state
            .privacy_controls
            .insert(canonical.id.clone(), canonical.clone());
        state.touch(&key);
        let version = state.version(&key);
        Ok(Versioned::new(canonical, Some(version)))
    }

    fn list_resilience_controls(&self) -> ApiResult<Vec<ResilienceControl>> {
        self.enter("list_resilience_controls", "")?;
        Ok(self
            .state
            .borrow()
            .resilience_controls
            .values()
            .cloned()
            .collect())
    }

    fn get_resilience_control(&self, id: &str) -> ApiResult<Option<Versioned<ResilienceControl>>> {
        self.enter("get_resilience_control", id)?;
        let state = self.state.borrow();
        let key = format!("resilience/{id}");
        Ok(state
            .resilience_controls
            .get(id)
            .map(|control| Versioned::new(control.clone(), Some(state.version(&key)))))
    }

    fn save_resilience_control(
        &self,
        control: &ResilienceControl,
        expected_version: Option<&str>,
    ) -> ApiResult<Versioned<ResilienceControl>> {
        self.enter("save_resilience_control", &control.id)?;
        let key = format!("resilience/{}", control.id);
        self.check_version(&key, expected_version)?;
        let mut state = self.state.borrow_mut();
        state
            .resilience_controls
            .insert(control.id.clone(), control.clone());
        state.touch(&key);
        let version = state.version(&key);
        Ok(Versioned::new(control.clone(), Some(version)))
    }

    fn list_sdm_controls(&self) -> ApiResult<Vec<SdmControlSummary>> {
        self.enter("list_sdm_controls", "")?;
        Ok(self
            .state
            .borrow()
            .sdm_controls
            .values()
            .map(|detail| SdmControlSummary {
                id: detail.id.clone(),
                title: detail.title.clone(),
                group_id: detail.group_id.clone(),
                props: SdmControlProps {
                    sdm_module: detail.props.sdm_module.clone(),
                    sdm_goals: detail.props.sdm_goals.clone(),
                    dsgvo_articles: detail.props.dsgvo_articles.clone(),
                },
            })
            .collect())
    }

    fn get_sdm_control(&self, id: &str) -> ApiResult<Option<SdmControlDetail>> {
        self.enter("get_sdm_control", id)?;
        Ok(self.state.borrow().sdm_controls.get(id).cloned())
    }

    fn list_mappings(&self) -> ApiResult<Vec<Mapping>> {
        self.enter("list_mappings", "")?;
        Ok(self.state.borrow().mappings.values().cloned().collect())
    }

    fn get_mapping(&self, sdm_control_id: &str) -> ApiResult<Option<Versioned<Mapping>>> {
        self.enter("get_mapping", sdm_control_id)?;
        let state = self.state.borrow();
        let key = format!("mapping/{sdm_control_id}");
        Ok(state
            .mappings
            .get(sdm_control_id)
            .map(|mapping| Versioned::new(mapping.clone(), Some(state.version(&key)))))
    }

    fn save_mapping(
        &self,
        mapping: &Mapping,
        expected_version: Option<&str>,
    ) -> ApiResult<Versioned<Mapping>> {
        self.enter("save_mapping", &mapping.sdm_control_id)?;
        let key = format!("mapping/{}", mapping.sdm_control_id);
        self.check_version(&key, expected_version)?;
        self.submitted_mappings.borrow_mut().push(mapping.clone());
        let mut state = self.state.borrow_mut();
        state
            .mappings
            .insert(mapping.sdm_control_id.clone(), mapping.clone());
        state.touch(&key);
        let version = state.version(&key);
        Ok(Versioned::new(mapping.clone(), Some(version)))
    }

    fn get_file(&self, key: FileKey) -> ApiResult<FileContent> {
        self.enter("get_file", key.as_str())?;
        let stored = self.state.borrow().files.get(key.as_str()).cloned();
        let content = match stored {
            Some(content) => content,
            None if key == FileKey::SdmMapping => self.mapping_file(),
            None => {
                return Err(ApiError::NotFound {
                    path: format!("/api/files/{key}"),
                })
            }
        };
        Ok(FileContent {
            name: Some(format!("{key}.json")),
            content,
        })
    }

    fn diff_file(&self, key: FileKey, _updated: &str) -> ApiResult<FileDiffResult> {
        self.enter("diff_file", key.as_str())?;
        Err(ApiError::Status {
            status: 501,
            body: "not supported by the fake".to_string(),
        })
    }
}

pub fn group(id: &str, title: &str, control_count: usize) -> PrivacyGroup {
    PrivacyGroup {
        id: id.to_string(),
        title: title.to_string(),
        description: None,
        control_count,
    }
}

pub fn privacy_control(id: &str, title: &str, group_id: Option<&str>) -> PrivacyControlDetail {
    PrivacyControlDetail {
        id: id.to_string(),
        title: title.to_string(),
        group_id: group_id.map(str::to_string),
        ..PrivacyControlDetail::default()
    }
}

pub fn resilience_control(id: &str, title: &str) -> ResilienceControl {
    ResilienceControl {
        id: id.to_string(),
        title: title.to_string(),
        ..ResilienceControl::default()
    }
}

pub fn sdm_control(id: &str, title: &str) -> SdmControlDetail {
    SdmControlDetail {
        id: id.to_string(),
        title: title.to_string(),
        class: None,
        group_id: None,
        props: Default::default(),
    }
}
