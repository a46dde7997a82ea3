//! Faethm stream set

use super::definition::{Enrichment, StreamDefinition};
use crate::pagination::PaginationConfig;
use crate::schema::Field;

/// Industries stream name
pub const INDUSTRIES: &str = "industries";
/// Emerging skills stream name
pub const EMERGING_SKILLS: &str = "emerging_skills";
/// Trending skills stream name
pub const TRENDING_SKILLS: &str = "trending_skills";
/// Declining skills stream name
pub const DECLINING_SKILLS: &str = "declining_skills";
/// Skills catalogue stream name
pub const SKILLS_LIST: &str = "skills_list";

/// Industry schema
pub const INDUSTRY_FIELDS: &[Field] = &[
    Field::string("id"),
    Field::string("name"),
    Field::string("country_code"),
];

/// Per-industry skill schema, shared by the three skill categories
pub const SKILL_FIELDS: &[Field] = &[
    Field::string("id"),
    Field::string("name"),
    Field::string("description"),
    Field::integer("rank"),
    Field::string("category"),
    Field::string("industry_id"),
    Field::string("country_code"),
];

/// Skills catalogue schema
pub const SKILLS_LIST_FIELDS: &[Field] = &[
    Field::string("id"),
    Field::string("name"),
    Field::string("description"),
];

const SKILL_KEY: &[&str] = &["id", "industry_id", "category"];

/// All streams exposed by the tap, parents before children
pub fn faethm_streams() -> Vec<StreamDefinition> {
    vec![
        StreamDefinition::new(INDUSTRIES, "/industries", INDUSTRY_FIELDS, &["id"])
            .paginate(PaginationConfig::cursor())
            .enrich(Enrichment::CountryCode),
        skill_stream(EMERGING_SKILLS, "emerging"),
        skill_stream(TRENDING_SKILLS, "trending"),
        skill_stream(DECLINING_SKILLS, "declining"),
        StreamDefinition::new(SKILLS_LIST, "/skills", SKILLS_LIST_FIELDS, &["id"])
            .records_path("$.skills[*]")
            .paginate(PaginationConfig::last_record()),
    ]
}

fn skill_stream(name: &str, category: &'static str) -> StreamDefinition {
    StreamDefinition::new(
        name,
        format!("/industries/{{industry_id}}/skills/{category}"),
        SKILL_FIELDS,
        SKILL_KEY,
    )
    .paginate(PaginationConfig::cursor())
    .child_of(INDUSTRIES, "id", "industry_id")
    .enrich(Enrichment::ParentId("industry_id"))
    .enrich(Enrichment::Constant {
        field: "category",
        value: category,
    })
    .enrich(Enrichment::Rank("rank"))
    .enrich(Enrichment::CountryCode)
}
