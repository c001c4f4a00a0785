#![forbid(unsafe_code)]

/// Atom entry metadata a property can be mapped onto.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyndicationItemProperty {
    AuthorEmail,
    AuthorName,
    AuthorUri,
    ContributorEmail,
    ContributorName,
    ContributorUri,
    Published,
    Rights,
    Summary,
    Title,
    Updated,
}

impl SyndicationItemProperty {
    pub const ALL: [SyndicationItemProperty; 11] = [
        Self::AuthorEmail,
        Self::AuthorName,
        Self::AuthorUri,
        Self::ContributorEmail,
        Self::ContributorName,
        Self::ContributorUri,
        Self::Published,
        Self::Rights,
        Self::Summary,
        Self::Title,
        Self::Updated,
    ];

    /// Declared name, e.g. `SyndicationTitle`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AuthorEmail => "SyndicationAuthorEmail",
            Self::AuthorName => "SyndicationAuthorName",
            Self::AuthorUri => "SyndicationAuthorUri",
            Self::ContributorEmail => "SyndicationContributorEmail",
            Self::ContributorName => "SyndicationContributorName",
            Self::ContributorUri => "SyndicationContributorUri",
            Self::Published => "SyndicationPublished",
            Self::Rights => "SyndicationRights",
            Self::Summary => "SyndicationSummary",
            Self::Title => "SyndicationTitle",
            Self::Updated => "SyndicationUpdated",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|item| item.name() == name)
    }

    /// Element path inside an Atom entry.
    pub fn target_path(&self) -> &'static str {
        match self {
            Self::AuthorEmail => "author/email",
            Self::AuthorName => "author/name",
            Self::AuthorUri => "author/uri",
            Self::ContributorEmail => "contributor/email",
            Self::ContributorName => "contributor/name",
            Self::ContributorUri => "contributor/uri",
            Self::Published => "published",
            Self::Rights => "rights",
            Self::Summary => "summary",
            Self::Title => "title",
            Self::Updated => "updated",
        }
    }

    /// Atom text constructs accept a content kind.
    pub fn is_text_construct(&self) -> bool {
        matches!(self, Self::Rights | Self::Summary | Self::Title)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextContentKind {
    #[default]
    Plaintext,
    Html,
    Xhtml,
}

impl TextContentKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "text" => Some(Self::Plaintext),
            "html" => Some(Self::Html),
            "xhtml" => Some(Self::Xhtml),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Plaintext => "text",
            Self::Html => "html",
            Self::Xhtml => "xhtml",
        }
    }
}
