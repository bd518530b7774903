use crate::api::Project;

/// Public URL of a project: the API base without its `/api` segment,
/// followed by `/projects/{slug}`.
///
/// A trailing `/api` is stripped; otherwise the first `/api` occurrence is.
pub fn project_url(project: &Project, api_base: &str) -> String {
    let api_base = api_base.trim_end_matches('/');
    let base = match api_base.strip_suffix("/api") {
        Some(base) => base.to_string(),
        None => api_base.replacen("/api", "", 1),
    };
    format!("{}/projects/{}", base, project.slug)
}
