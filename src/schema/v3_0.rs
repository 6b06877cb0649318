//! 3.0 renames several raw keys. Accessor names stay those of 2.x so stored
//! queries keep working.

use super::v2_0::{ANALYSIS_METHOD, DATA, EVALUATION, RESULT};
use super::{FeatureSyntax, FieldDef, PaperSchema, RecordSchema};

static AUTHOR: RecordSchema = RecordSchema {
    name: "v3_0.reference.authors",
    fields: &[
        FieldDef::value("author").stored_as("name"),
        FieldDef::value("affiliation"),
    ],
};

pub(crate) static REFERENCE: RecordSchema = RecordSchema {
    name: "v3_0.reference",
    fields: &[
        FieldDef::value("title"),
        FieldDef::value("year"),
        FieldDef::records("authors", &AUTHOR),
        FieldDef::value("bibtex"),
        FieldDef::value("doi"),
    ],
};

static STREAM: RecordSchema = RecordSchema {
    name: "v3_0.preprocessing.stream",
    fields: &[FieldDef::value("features"), FieldDef::value("protocols")],
};

static PREPROCESSING: RecordSchema = RecordSchema {
    name: "v3_0.preprocessing",
    fields: &[
        FieldDef::records("packets", &STREAM),
        FieldDef::records("flows", &STREAM),
        FieldDef::records("flow_aggregations", &STREAM).stored_as("aggregations"),
        FieldDef::value("normalization_type"),
    ],
};

static PAPER: RecordSchema = RecordSchema {
    name: "v3_0",
    fields: &[
        FieldDef::value("version"),
        FieldDef::record("reference", &REFERENCE),
        FieldDef::record("data", &DATA),
        FieldDef::record("preprocessing", &PREPROCESSING),
        FieldDef::record("analysis_method", &ANALYSIS_METHOD),
        FieldDef::record("evaluation", &EVALUATION),
        FieldDef::record("result", &RESULT),
    ],
};

pub(crate) static SCHEMA: PaperSchema = PaperSchema {
    key: "3.0",
    root: &PAPER,
    features: FeatureSyntax::FunctionCalls,
};
