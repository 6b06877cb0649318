use super::{FeatureSyntax, FieldDef, PaperSchema, RecordSchema};

pub(crate) static AUTHOR: RecordSchema = RecordSchema {
    name: "v2_0.reference.authors",
    fields: &[FieldDef::value("author"), FieldDef::value("affiliation")],
};

pub(crate) static REFERENCE: RecordSchema = RecordSchema {
    name: "v2_0.reference",
    fields: &[
        FieldDef::value("title"),
        FieldDef::value("year"),
        FieldDef::records("authors", &AUTHOR),
        FieldDef::value("bibtex"),
    ],
};

pub(crate) static DATASET: RecordSchema = RecordSchema {
    name: "v2_0.data.datasets",
    fields: &[
        FieldDef::value("name"),
        FieldDef::value("type"),
        FieldDef::value("year"),
        FieldDef::value("available"),
    ],
};

pub(crate) static DATA: RecordSchema = RecordSchema {
    name: "v2_0.data",
    fields: &[FieldDef::records("datasets", &DATASET)],
};

pub(crate) static STREAM: RecordSchema = RecordSchema {
    name: "v2_0.preprocessing.stream",
    fields: &[FieldDef::value("features")],
};

pub(crate) static PREPROCESSING: RecordSchema = RecordSchema {
    name: "v2_0.preprocessing",
    fields: &[
        FieldDef::records("packets", &STREAM),
        FieldDef::records("flows", &STREAM),
        FieldDef::records("flow_aggregations", &STREAM),
        FieldDef::value("normalization_type"),
    ],
};

pub(crate) static ALGORITHM: RecordSchema = RecordSchema {
    name: "v2_0.analysis_method.algorithms",
    fields: &[FieldDef::value("algorithm"), FieldDef::value("type")],
};

pub(crate) static ANALYSIS_METHOD: RecordSchema = RecordSchema {
    name: "v2_0.analysis_method",
    fields: &[
        FieldDef::value("type"),
        FieldDef::value("supervised_learning"),
        FieldDef::value("unsupervised_learning"),
        FieldDef::records("algorithms", &ALGORITHM),
        FieldDef::value("tools"),
    ],
};

pub(crate) static EVALUATION: RecordSchema = RecordSchema {
    name: "v2_0.evaluation",
    fields: &[FieldDef::value("metrics"), FieldDef::value("comparison")],
};

pub(crate) static RESULT: RecordSchema = RecordSchema {
    name: "v2_0.result",
    fields: &[FieldDef::value("summary"), FieldDef::value("limitations")],
};

static PAPER: RecordSchema = RecordSchema {
    name: "v2_0",
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
    key: "2.0",
    root: &PAPER,
    features: FeatureSyntax::Operations,
};
