//! Table descriptors shared by every store implementation.
//!
//! Records travel as JSON objects keyed by camelCase field names, while the
//! database uses snake_case columns. Each [`Column`] carries both spellings.
//! `sql/schema.sql` must stay in sync with these descriptors (checked by a
//! test in `lib.rs`).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Bool,
    Int,
    Date,
    Timestamp,
}

#[derive(Debug)]
pub struct Column {
    /// Record key, e.g. `englishTitle`.
    pub field: &'static str,
    /// Database column, e.g. `english_title`.
    pub sql: &'static str,
    pub kind: ColumnType,
    /// Included in list projections. Answer bodies are left out of lists.
    pub listed: bool,
}

const fn column(field: &'static str, sql: &'static str, kind: ColumnType) -> Column {
    Column {
        field,
        sql,
        kind,
        listed: true,
    }
}

const fn text(field: &'static str, sql: &'static str) -> Column {
    column(field, sql, ColumnType::Text)
}

const fn body(field: &'static str, sql: &'static str) -> Column {
    Column {
        field,
        sql,
        kind: ColumnType::Text,
        listed: false,
    }
}

const fn flag(field: &'static str, sql: &'static str) -> Column {
    column(field, sql, ColumnType::Bool)
}

const fn int(field: &'static str, sql: &'static str) -> Column {
    column(field, sql, ColumnType::Int)
}

const fn date(field: &'static str, sql: &'static str) -> Column {
    column(field, sql, ColumnType::Date)
}

const fn timestamp(field: &'static str, sql: &'static str) -> Column {
    column(field, sql, ColumnType::Timestamp)
}

/// A `BYTEA` column holding an uploaded file.
#[derive(Debug)]
pub struct BlobSlot {
    /// Upload field name, e.g. `coverImage`.
    pub field: &'static str,
    pub sql: &'static str,
    /// Record flag reporting presence, e.g. `hasCoverImage`.
    pub flag: &'static str,
    /// Text column that stores the uploaded content type, if any.
    pub type_field: Option<&'static str>,
    /// Text column that stores the original file name, if any.
    pub name_field: Option<&'static str>,
    pub default_type: &'static str,
}

const fn image_slot() -> BlobSlot {
    BlobSlot {
        field: "image",
        sql: "image",
        flag: "hasImage",
        type_field: Some("imageType"),
        name_field: None,
        default_type: "image/jpeg",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    /// Flip `is_deleted`; reads skip the row from then on.
    Soft,
    /// Remove the row.
    Hard,
}

/// Rows owned by a parent record, written and replaced together with it.
#[derive(Debug)]
pub struct Children {
    pub table: &'static Table,
    /// Field in the child table holding the parent id.
    pub foreign_key: &'static str,
}

#[derive(Debug)]
pub struct Table {
    /// Resource name used in routes and messages, e.g. `articles`.
    pub resource: &'static str,
    /// Singular label used in messages, e.g. `Article`.
    pub label: &'static str,
    pub name: &'static str,
    pub columns: &'static [Column],
    pub blobs: &'static [BlobSlot],
    pub deletion: Deletion,
    /// Fields the slug is derived from, in precedence order.
    pub title_fields: &'static [&'static str],
    pub children: Option<Children>,
}

impl Table {
    #[must_use]
    pub fn column(&self, field: &str) -> Option<&'static Column> {
        let columns: &'static [Column] = self.columns;
        columns.iter().find(|column| column.field == field)
    }

    #[must_use]
    pub fn blob(&self, field: &str) -> Option<&'static BlobSlot> {
        let blobs: &'static [BlobSlot] = self.blobs;
        blobs.iter().find(|slot| slot.field == field)
    }

    #[must_use]
    pub const fn is_soft_deleted(&self) -> bool {
        matches!(self.deletion, Deletion::Soft)
    }

    #[must_use]
    pub fn has_slug(&self) -> bool {
        self.column("slug").is_some()
    }
}

pub static ARTICLES: Table = Table {
    resource: "articles",
    label: "Article",
    name: "articles",
    columns: &[
        text("title", "title"),
        text("slug", "slug"),
        text("englishTitle", "english_title"),
        text("englishDescription", "english_description"),
        text("urduTitle", "urdu_title"),
        text("urduDescription", "urdu_description"),
        text("romanUrduTitle", "roman_urdu_title"),
        text("romanUrduDescription", "roman_urdu_description"),
        text("hindiTitle", "hindi_title"),
        text("hindiDescription", "hindi_description"),
        text("topic", "topic"),
        text("writers", "writers"),
        text("translator", "translator"),
        text("language", "language"),
        date("date", "date"),
        text("tags", "tags"),
        int("views", "views"),
        flag("isPublished", "is_published"),
        text("writerDesignation", "writer_designation"),
        timestamp("createdAt", "created_at"),
        text("imageType", "image_type"),
    ],
    blobs: &[image_slot()],
    deletion: Deletion::Soft,
    title_fields: &[
        "title",
        "englishTitle",
        "urduTitle",
        "romanUrduTitle",
        "hindiTitle",
    ],
    children: None,
};

pub static EVENTS: Table = Table {
    resource: "events",
    label: "Event",
    name: "events",
    columns: &[
        text("title", "title"),
        text("slug", "slug"),
        text("englishTitle", "english_title"),
        text("englishDescription", "english_description"),
        text("urduTitle", "urdu_title"),
        text("urduDescription", "urdu_description"),
        text("romanUrduTitle", "roman_urdu_title"),
        text("romanUrduDescription", "roman_urdu_description"),
        text("hindiTitle", "hindi_title"),
        text("hindiDescription", "hindi_description"),
        text("topic", "topic"),
        text("language", "language"),
        text("writers", "writers"),
        text("translator", "translator"),
        text("tags", "tags"),
        date("eventDate", "event_date"),
        text("venue", "venue"),
        flag("isPublished", "is_published"),
        text("writerDesignation", "writer_designation"),
        int("views", "views"),
        text("imageType", "image_type"),
    ],
    blobs: &[image_slot()],
    deletion: Deletion::Soft,
    title_fields: &[
        "title",
        "englishTitle",
        "urduTitle",
        "romanUrduTitle",
        "hindiTitle",
    ],
    children: None,
};

pub static BOOKS: Table = Table {
    resource: "books",
    label: "Book",
    name: "books",
    columns: &[
        text("title", "title"),
        text("slug", "slug"),
        text("isbn", "isbn"),
        text("description", "description"),
        text("author", "author"),
        text("translator", "translator"),
        date("bookDate", "book_date"),
        text("status", "status"),
        text("category", "category"),
        text("language", "language"),
        flag("isPublished", "is_published"),
        int("views", "views"),
        int("downloads", "downloads"),
        text("coverImageType", "cover_image_type"),
        text("attachmentName", "attachment_name"),
    ],
    blobs: &[
        BlobSlot {
            field: "coverImage",
            sql: "cover_image",
            flag: "hasCoverImage",
            type_field: Some("coverImageType"),
            name_field: None,
            default_type: "image/jpeg",
        },
        BlobSlot {
            field: "attachment",
            sql: "attachment",
            flag: "hasAttachment",
            type_field: None,
            name_field: Some("attachmentName"),
            default_type: "application/pdf",
        },
    ],
    deletion: Deletion::Soft,
    title_fields: &["title"],
    children: None,
};

pub static QUESTIONS: Table = Table {
    resource: "questions",
    label: "Question",
    name: "questions",
    columns: &[
        text("slug", "slug"),
        text("questionEnglish", "question_english"),
        body("answerEnglish", "answer_english"),
        text("questionUrdu", "question_urdu"),
        body("answerUrdu", "answer_urdu"),
        text("questionRoman", "question_roman"),
        body("answerRoman", "answer_roman"),
        text("questionHindi", "question_hindi"),
        body("answerHindi", "answer_hindi"),
        text("writer", "writer"),
        date("date", "date"),
        text("tags", "tags"),
        text("language", "language"),
        text("topic", "topic"),
        text("translator", "translator"),
        text("answeredStatus", "answered_status"),
        flag("isPublished", "is_published"),
        int("views", "views"),
        text("imageName", "image_name"),
        text("imageType", "image_type"),
    ],
    blobs: &[BlobSlot {
        name_field: Some("imageName"),
        ..image_slot()
    }],
    deletion: Deletion::Soft,
    title_fields: &[
        "questionEnglish",
        "questionUrdu",
        "questionRoman",
        "questionHindi",
    ],
    children: None,
};

pub static WRITERS: Table = Table {
    resource: "writers",
    label: "Writer",
    name: "writers",
    columns: &[
        text("name", "name"),
        text("designation", "designation"),
        text("email", "email"),
        date("joinedDate", "joined_date"),
        text("status", "status"),
        text("englishDescription", "english_description"),
        text("urduDescription", "urdu_description"),
        flag("isTeamMember", "is_team_member"),
        text("imageType", "image_type"),
    ],
    blobs: &[image_slot()],
    deletion: Deletion::Soft,
    title_fields: &["name"],
    children: None,
};

pub static TRANSLATORS: Table = Table {
    resource: "translators",
    label: "Translator",
    name: "translators",
    columns: &[
        text("name", "name"),
        text("designation", "designation"),
        text("englishDescription", "english_description"),
        text("urduDescription", "urdu_description"),
        text("imageType", "image_type"),
    ],
    blobs: &[image_slot()],
    deletion: Deletion::Hard,
    title_fields: &["name"],
    children: None,
};

pub static TOPICS: Table = Table {
    resource: "topics",
    label: "Topic",
    name: "topics",
    columns: &[
        text("topic", "topic"),
        text("about", "about"),
        text("imageType", "image_type"),
    ],
    blobs: &[image_slot()],
    deletion: Deletion::Soft,
    title_fields: &["topic"],
    children: None,
};

pub static GALLERIES: Table = Table {
    resource: "galleries",
    label: "Gallery",
    name: "galleries",
    columns: &[
        text("title", "title"),
        text("description", "description"),
        date("eventDate", "event_date"),
    ],
    blobs: &[],
    deletion: Deletion::Hard,
    title_fields: &["title"],
    children: Some(Children {
        table: &GALLERY_IMAGES,
        foreign_key: "galleryId",
    }),
};

pub static GALLERY_IMAGES: Table = Table {
    resource: "gallery_images",
    label: "Gallery image",
    name: "gallery_images",
    columns: &[
        int("galleryId", "gallery_id"),
        text("imageName", "image_name"),
        text("imageType", "image_type"),
    ],
    blobs: &[BlobSlot {
        name_field: Some("imageName"),
        default_type: "application/octet-stream",
        ..image_slot()
    }],
    deletion: Deletion::Hard,
    title_fields: &[],
    children: None,
};

pub static TAGS: Table = Table {
    resource: "tags",
    label: "Tag",
    name: "tags",
    columns: &[text("tag", "tag")],
    blobs: &[],
    deletion: Deletion::Soft,
    title_fields: &["tag"],
    children: None,
};

pub static LANGUAGES: Table = Table {
    resource: "languages",
    label: "Language",
    name: "languages",
    columns: &[text("language", "language")],
    blobs: &[],
    deletion: Deletion::Hard,
    title_fields: &["language"],
    children: None,
};

pub static FEEDBACK: Table = Table {
    resource: "feedback",
    label: "Feedback",
    name: "feedback",
    columns: &[
        text("name", "name"),
        text("email", "email"),
        text("feedback", "feedback"),
    ],
    blobs: &[],
    deletion: Deletion::Soft,
    title_fields: &[],
    children: None,
};

/// The "about us" sections.
pub static ABOUT: Table = Table {
    resource: "about",
    label: "About content",
    name: "about_contents",
    columns: &[
        text("englishTitle", "english_title"),
        text("urduTitle", "urdu_title"),
        text("englishDescription", "english_description"),
        text("urduDescription", "urdu_description"),
        text("imageType", "image_type"),
    ],
    blobs: &[image_slot()],
    deletion: Deletion::Soft,
    title_fields: &["englishTitle", "urduTitle"],
    children: None,
};

pub static BOOK_REQUESTS: Table = Table {
    resource: "requestBook",
    label: "Book request",
    name: "book_requests",
    columns: &[
        text("name", "name"),
        text("email", "email"),
        text("contact", "contact"),
        text("address", "address"),
        text("books", "books"),
    ],
    blobs: &[],
    deletion: Deletion::Soft,
    title_fields: &[],
    children: None,
};

pub static HOME_BOOK_SLIDER: Table = Table {
    resource: "homebookslider",
    label: "Slider book",
    name: "home_books_slider",
    columns: &[
        text("bookName", "book_name"),
        text("bookImageType", "book_image_type"),
    ],
    blobs: &[BlobSlot {
        field: "bookImage",
        sql: "book_image",
        flag: "hasBookImage",
        type_field: Some("bookImageType"),
        name_field: None,
        default_type: "image/jpeg",
    }],
    deletion: Deletion::Soft,
    title_fields: &["bookName"],
    children: None,
};

/// Every table, parents before children.
pub static TABLES: [&Table; 15] = [
    &ARTICLES,
    &EVENTS,
    &BOOKS,
    &QUESTIONS,
    &WRITERS,
    &TRANSLATORS,
    &TOPICS,
    &GALLERIES,
    &GALLERY_IMAGES,
    &TAGS,
    &LANGUAGES,
    &FEEDBACK,
    &ABOUT,
    &BOOK_REQUESTS,
    &HOME_BOOK_SLIDER,
];

/// Looks a table up by its resource name.
#[must_use]
pub fn by_resource(resource: &str) -> Option<&'static Table> {
    TABLES
        .iter()
        .copied()
        .find(|table| table.resource == resource)
}
