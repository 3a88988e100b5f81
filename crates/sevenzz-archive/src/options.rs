use crate::sanitize::TargetPlatform;

/// How an extraction should treat the destination.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Replace files that already exist in the destination.
    pub overwrite: bool,
    /// Naming rules of the destination filesystem.
    pub target: TargetPlatform,
    /// Restrict extraction to these member names.
    pub members: Option<Vec<String>>,
}

impl ExtractOptions {
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn target(mut self, target: TargetPlatform) -> Self {
        self.target = target;
        self
    }

    pub fn members<I, S>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.members = Some(members.into_iter().map(Into::into).collect());
        self
    }

    /// Whether `name` is selected by [`ExtractOptions::members`].
    pub fn selects(&self, name: &str) -> bool {
        self.members
            .as_ref()
            .is_none_or(|members| members.iter().any(|m| m == name))
    }
}
