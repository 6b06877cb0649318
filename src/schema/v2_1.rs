//! 2.1 adds the DOI to the reference and the protocols seen by each stream.

use super::v2_0::{ANALYSIS_METHOD, AUTHOR, DATA, EVALUATION, RESULT};
use super::{FeatureSyntax, FieldDef, PaperSchema, RecordSchema};

static REFERENCE: RecordSchema = RecordSchema {
    name: "v2_1.reference",
    fields: &[
        FieldDef::value("title"),
        FieldDef::value("year"),
        FieldDef::records("authors", &AUTHOR),
        FieldDef::value("bibtex"),
        FieldDef::value("doi"),
    ],
};

static STREAM: RecordSchema = RecordSchema {
    name: "v2_1.preprocessing.stream",
    fields: &[FieldDef::value("features"), FieldDef::value("protocols")],
};

static PREPROCESSING: RecordSchema = RecordSchema {
    name: "v2_1.preprocessing",
    fields: &[
        FieldDef::records("packets", &STREAM),
        FieldDef::records("flows", &STREAM),
        FieldDef::records("flow_aggregations", &STREAM),
        FieldDef::value("normalization_type"),
    ],
};

static PAPER: RecordSchema = RecordSchema {
    name: "v2_1",
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
    key: "2.1",
    root: &PAPER,
    features: FeatureSyntax::Operations,
};
