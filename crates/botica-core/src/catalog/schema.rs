//! Declarative schema mapping for the nine brand catalogs.
//!
//! Every brand spreadsheet is described by data, not code: the ordered column
//! names per sheet, the columns to ignore, how many leading junk rows to
//! skip, and a composition recipe describing which columns feed the product,
//! code and description output fields and under which literal sentence
//! prefixes. Multi-sheet brands carry one schema entry per sheet. Adding a
//! brand means adding a table entry here.

/// One composable sentence of an output field.
#[derive(Debug, Clone, Copy)]
pub enum Segment {
    /// "{label} {value}." when the column is non-empty.
    Labeled {
        label: &'static str,
        column: &'static str,
    },
    /// "{label}: {value}." when the column is non-empty.
    LabeledColon {
        label: &'static str,
        column: &'static str,
    },
    /// "{value}." when the column is non-empty.
    Bare { column: &'static str },
    /// "{label} {brand}.", always emitted.
    BrandTag { label: &'static str },
    /// "Keywords: kw1; kw2." built from the listed columns, deduplicated.
    Keywords {
        columns: &'static [&'static str],
    },
    /// "{label}: a. b. c.", the dot-join of the non-empty listed columns.
    JoinLabeled {
        label: &'static str,
        columns: &'static [&'static str],
    },
    /// "Presentación {size}{units}." when both columns are non-empty.
    Presentation {
        size: &'static str,
        units: &'static str,
    },
    /// "Presentación: {space-join, units squashed}." over the listed columns.
    PresentationJoin {
        columns: &'static [&'static str],
    },
    /// "Dimensiones {a}{unit} x {b}{unit} x {c}{unit}." when all are present.
    Dimensions {
        columns: &'static [&'static str],
        unit: &'static str,
    },
    /// "Peso {value}{unit}." when the column is non-empty.
    Weight {
        column: &'static str,
        unit: &'static str,
    },
    /// "{Column}: {value}." for every sheet column not dropped and not listed
    /// in `exclude`, in sheet column order.
    Remainder {
        exclude: &'static [&'static str],
    },
}

/// How the three canonical output fields are assembled for a brand.
#[derive(Debug, Clone, Copy)]
pub struct Recipe {
    pub product: &'static [Segment],
    pub code: &'static [Segment],
    pub description: &'static [Segment],
}

/// Column layout of one worksheet.
#[derive(Debug, Clone, Copy)]
pub struct SheetSchema {
    pub columns: &'static [&'static str],
    pub drop: &'static [&'static str],
    /// Data rows to skip after the header (misaligned second header rows).
    pub skip_rows: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct BrandSchema {
    /// Display name, as written into "Marca …" sentences.
    pub name: &'static str,
    /// Lowercase identifier used for corpus file names.
    pub slug: &'static str,
    /// File stem of the brand's source table and catalog CSV export.
    pub table_stem: &'static str,
    /// Column holding the EAN join key.
    pub ean_column: &'static str,
    pub sheets: &'static [SheetSchema],
    pub recipe: Recipe,
}

impl BrandSchema {
    pub fn corpus_file_name(&self) -> String {
        format!("{}_all.txt", self.slug)
    }
}

const CEPAGE_COLUMNS: &[&str] = &[
    "categoria", "nombre de linea", "tipo de linea", "necesidades", "sku", "ean", "producto",
    "descripcion", "indicacion", "uso", "inci", "activos", "beneficios", "generales",
    "presentacion", "ancho", "profundidad", "alto", "peso",
];

const CETAPHIL_COLUMNS: &[&str] = &[
    "producto", "marca", "nombre", "presentacion", "ean", "categoria", "subcategoria", "zona",
    "descripcion", "keywords",
];

const EUCERIN_COLUMNS: &[&str] = &[
    "fecha", "estado", "ean", "producto", "linea", "categoria", "segmento", "contenido", "zona",
    "nombre", "nombre corto", "descripcion", "descripcion corta", "beneficios 1", "beneficios 2",
    "beneficios 3", "beneficios 4", "beneficios 5", "piel", "propiedades", "ingredientes", "uso",
    "keywords",
];

const EXIMIA_COLUMNS: &[&str] = &[
    "ean", "nombre", "necesidad", "linea", "piel", "titulo", "bajada", "descripcion", "uso",
    "activos", "beneficios", "comentarios", "inci", "keywords", "presentacion", "contenido",
    "unidades", "ancho", "profundidad", "alto", "peso",
];

const ISDIN_COLUMNS: &[&str] = &[
    "id", "codigo", "sku", "ean", "nombre", "variante", "marca", "generales", "id_ml",
    "descripcion",
];

const LOREAL_SHEET0: &[&str] = &[
    "categoria", "marca", "franquicia", "subfranquicia", "ean", "titulo", "tipo", "descripcion",
    "beneficios", "aplicacion", "piel", "uso", "zona", "efecto", "hipoalergenico", "crosselling",
    "keywords", "tamaño", "unidades", "link", "0", "1",
];
const LOREAL_SHEET1: &[&str] = &[
    "categoria", "marca", "franquicia", "subfranquicia", "ean", "titulo", "tipo", "descripcion",
    "beneficios", "aplicacion", "crosselling", "keywords", "hipoalergenico", "pelo", "uso",
    "tamaño", "unidades", "link", "0",
];
const LOREAL_SHEET2: &[&str] = &[
    "categoria", "marca", "franquicia", "subfranquicia", "ean", "titulo", "color", "numero",
    "nombre", "tipo de producto", "descripcion", "presentacion", "beneficios", "aplicacion",
    "crosselling", "keywords", "hipoalergenico", "tamaño", "unidades", "link",
];
const LOREAL_SHEET3: &[&str] = &[
    "categoria", "ean", "marca", "franquicia", "subfranquicia", "titulo", "tipo de producto",
    "resumen", "descripcion", "adicionales", "presentacion", "beneficio 1", "beneficio 2",
    "beneficio 3", "aplicacion", "crosselling", "keywords", "hipoalergenico", "piel", "uso",
    "zona", "efecto", "codigo hexa", "tamaño", "unidades",
];
const LOREAL_SHEET4: &[&str] = &[
    "categoria", "marca", "ean", "franquicia", "subfranquicia", "zona", "titulo", "color",
    "numero", "nombre", "tipo de producto", "descripcion", "beneficios", "aplicacion", "piel",
    "uso", "efecto", "hipoalergenico", "crosselling", "keywords", "tamaño", "unidades", "link",
];

const REVLON_SHEET_FULL: &[&str] = &[
    "tipo", "categoria", "subcategoria", "familia", "product", "producto", "descripcion mkt",
    "caracteristicas", "codigo sap", "ean", "merch code", "tono", "stock",
];
const REVLON_SHEET_NO_TONE: &[&str] = &[
    "tipo", "categoria", "subcategoria", "familia", "product", "producto", "descripcion mkt",
    "caracteristicas", "codigo sap", "ean", "merch code", "stock",
];
const REVLON_SHEET_SHORT: &[&str] = &[
    "tipo", "categoria", "subcategoria", "familia", "product", "producto", "descripcion mkt",
    "caracteristicas", "codigo sap", "ean", "stock",
];

const VICHY_COLUMNS: &[&str] = &[
    "codigo", "sku", "ean", "producto", "uso", "marca", "ml_code", "descripcion",
];

const LRP_COLUMNS: &[&str] = &[
    "ean", "producto", "descripcion", "tamaño", "unidades", "composicion", "beneficio 1",
    "beneficio 2", "beneficio 3", "uso", "keywords",
];

/// The full brand catalog, one entry per brand, multi-sheet brands with one
/// sheet schema per worksheet.
pub static BRANDS: &[BrandSchema] = &[
    BrandSchema {
        name: "Cepage",
        slug: "cepage",
        table_stem: "cepage",
        ean_column: "ean",
        sheets: &[SheetSchema {
            columns: CEPAGE_COLUMNS,
            drop: &[],
            skip_rows: 0,
        }],
        recipe: Recipe {
            product: &[
                Segment::Labeled { label: "Producto", column: "producto" },
                Segment::BrandTag { label: "Marca" },
            ],
            code: &[
                Segment::Labeled { label: "Código EAN", column: "ean" },
                Segment::Labeled { label: "Código SKU", column: "sku" },
            ],
            description: &[
                Segment::LabeledColon { label: "Descripción", column: "descripcion" },
                Segment::LabeledColon { label: "Indicaciones", column: "indicacion" },
                Segment::LabeledColon { label: "Uso", column: "uso" },
                Segment::LabeledColon { label: "Beneficios", column: "beneficios" },
                Segment::Keywords {
                    columns: &["categoria", "nombre de linea", "tipo de linea", "necesidades", "generales"],
                },
                Segment::Labeled { label: "Presentación", column: "presentacion" },
                Segment::Dimensions { columns: &["ancho", "profundidad", "alto"], unit: "mm" },
                Segment::Weight { column: "peso", unit: "gr" },
            ],
        },
    },
    BrandSchema {
        name: "Cetaphil",
        slug: "cetaphil",
        table_stem: "cetaphil",
        ean_column: "ean",
        sheets: &[SheetSchema {
            columns: CETAPHIL_COLUMNS,
            drop: &["producto", "marca"],
            skip_rows: 0,
        }],
        recipe: Recipe {
            product: &[
                Segment::Labeled { label: "Producto", column: "nombre" },
                Segment::BrandTag { label: "Marca" },
            ],
            code: &[Segment::Labeled { label: "Código EAN", column: "ean" }],
            description: &[
                Segment::LabeledColon { label: "Descripción", column: "descripcion" },
                Segment::Keywords { columns: &["categoria", "subcategoria", "zona", "keywords"] },
                Segment::Labeled { label: "Presentación", column: "presentacion" },
            ],
        },
    },
    BrandSchema {
        name: "Eucerin",
        slug: "eucerin",
        table_stem: "eucerin",
        ean_column: "ean",
        sheets: &[SheetSchema {
            columns: EUCERIN_COLUMNS,
            drop: &["fecha", "estado"],
            skip_rows: 0,
        }],
        recipe: Recipe {
            product: &[
                Segment::Labeled { label: "Producto", column: "producto" },
                Segment::BrandTag { label: "Marca" },
            ],
            code: &[Segment::Labeled { label: "Código EAN", column: "ean" }],
            description: &[
                Segment::LabeledColon { label: "Descripción", column: "descripcion" },
                Segment::LabeledColon { label: "Contenido", column: "contenido" },
                Segment::LabeledColon { label: "Propiedades", column: "propiedades" },
                Segment::JoinLabeled {
                    label: "Beneficios",
                    columns: &["beneficios 1", "beneficios 2", "beneficios 3", "beneficios 4", "beneficios 5"],
                },
                Segment::LabeledColon { label: "Modo de uso", column: "uso" },
                Segment::Keywords {
                    columns: &["linea", "categoria", "segmento", "zona", "piel", "keywords"],
                },
            ],
        },
    },
    BrandSchema {
        name: "Eximia",
        slug: "eximia",
        table_stem: "eximia",
        ean_column: "ean",
        sheets: &[SheetSchema {
            columns: EXIMIA_COLUMNS,
            drop: &[],
            skip_rows: 1,
        }],
        recipe: Recipe {
            product: &[
                Segment::Labeled { label: "Producto", column: "nombre" },
                Segment::BrandTag { label: "Marca" },
            ],
            code: &[Segment::Labeled { label: "Código EAN", column: "ean" }],
            description: &[
                Segment::JoinLabeled {
                    label: "Descripción",
                    columns: &["titulo", "bajada", "descripcion", "uso", "activos", "beneficios", "comentarios", "inci"],
                },
                Segment::Keywords { columns: &["necesidad", "linea", "piel", "keywords"] },
                Segment::PresentationJoin { columns: &["presentacion", "contenido", "unidades"] },
                Segment::Dimensions { columns: &["ancho", "profundidad", "alto"], unit: "mm" },
                Segment::Weight { column: "peso", unit: "gr" },
            ],
        },
    },
    BrandSchema {
        name: "Isdin",
        slug: "isdin",
        table_stem: "isdin",
        ean_column: "ean",
        sheets: &[SheetSchema {
            columns: ISDIN_COLUMNS,
            drop: &["id_ml"],
            skip_rows: 1,
        }],
        recipe: Recipe {
            product: &[
                Segment::Labeled { label: "Producto", column: "nombre" },
                Segment::BrandTag { label: "Marca" },
            ],
            code: &[
                Segment::Labeled { label: "Id", column: "id" },
                Segment::Labeled { label: "Código", column: "codigo" },
                Segment::Labeled { label: "Código SKU", column: "sku" },
                Segment::Labeled { label: "Código EAN", column: "ean" },
            ],
            description: &[
                Segment::LabeledColon { label: "Descripción", column: "descripcion" },
                Segment::Bare { column: "generales" },
                Segment::Bare { column: "variante" },
            ],
        },
    },
    BrandSchema {
        name: "Loreal",
        slug: "loreal",
        table_stem: "loreal",
        ean_column: "ean",
        sheets: &[
            SheetSchema {
                columns: LOREAL_SHEET0,
                drop: &["crosselling", "link", "0", "1"],
                skip_rows: 0,
            },
            SheetSchema {
                columns: LOREAL_SHEET1,
                drop: &["crosselling", "link", "0"],
                skip_rows: 0,
            },
            SheetSchema {
                columns: LOREAL_SHEET2,
                drop: &["color", "numero", "nombre", "crosselling", "link"],
                skip_rows: 0,
            },
            SheetSchema {
                columns: LOREAL_SHEET3,
                drop: &["efecto", "codigo hexa"],
                skip_rows: 0,
            },
            SheetSchema {
                columns: LOREAL_SHEET4,
                drop: &["color", "numero", "nombre", "crosselling", "link"],
                skip_rows: 0,
            },
        ],
        recipe: Recipe {
            product: &[
                Segment::Labeled { label: "Marca", column: "marca" },
                Segment::LabeledColon { label: "Título", column: "titulo" },
            ],
            code: &[Segment::Labeled { label: "Código EAN", column: "ean" }],
            description: &[
                Segment::Remainder {
                    exclude: &["marca", "titulo", "ean", "tamaño", "unidades", "keywords"],
                },
                Segment::Presentation { size: "tamaño", units: "unidades" },
                Segment::Keywords { columns: &["keywords"] },
            ],
        },
    },
    BrandSchema {
        name: "La Roche-Posay",
        slug: "la roche-posay",
        table_stem: "lrp",
        ean_column: "ean",
        sheets: &[SheetSchema {
            columns: LRP_COLUMNS,
            drop: &[],
            skip_rows: 0,
        }],
        recipe: Recipe {
            product: &[
                Segment::Labeled { label: "Producto", column: "producto" },
                Segment::BrandTag { label: "Marca" },
            ],
            code: &[Segment::Labeled { label: "Código EAN", column: "ean" }],
            description: &[
                Segment::Remainder {
                    exclude: &["producto", "ean", "tamaño", "unidades", "keywords"],
                },
                Segment::Presentation { size: "tamaño", units: "unidades" },
                Segment::Keywords { columns: &["keywords"] },
            ],
        },
    },
    BrandSchema {
        name: "Revlon",
        slug: "revlon",
        table_stem: "revlon",
        ean_column: "ean",
        sheets: &[
            SheetSchema { columns: REVLON_SHEET_FULL, drop: &["stock"], skip_rows: 0 },
            SheetSchema { columns: REVLON_SHEET_FULL, drop: &["stock"], skip_rows: 0 },
            SheetSchema { columns: REVLON_SHEET_NO_TONE, drop: &["stock"], skip_rows: 0 },
            SheetSchema { columns: REVLON_SHEET_FULL, drop: &["stock"], skip_rows: 0 },
            SheetSchema { columns: REVLON_SHEET_SHORT, drop: &["stock"], skip_rows: 0 },
        ],
        recipe: Recipe {
            product: &[
                Segment::BrandTag { label: "Marca" },
                Segment::Labeled { label: "Product", column: "product" },
                Segment::Labeled { label: "Producto", column: "producto" },
            ],
            code: &[
                Segment::Labeled { label: "Código SAP", column: "codigo sap" },
                Segment::Labeled { label: "Código EAN", column: "ean" },
                Segment::Labeled { label: "Merch code", column: "merch code" },
            ],
            description: &[Segment::Remainder {
                exclude: &["product", "producto", "codigo sap", "ean", "merch code"],
            }],
        },
    },
    BrandSchema {
        name: "Vichy",
        slug: "vichy",
        table_stem: "vichy",
        ean_column: "ean",
        sheets: &[SheetSchema {
            columns: VICHY_COLUMNS,
            drop: &["ml_code"],
            skip_rows: 0,
        }],
        recipe: Recipe {
            product: &[
                Segment::Labeled { label: "Producto", column: "producto" },
                Segment::Labeled { label: "Marca", column: "marca" },
            ],
            code: &[
                Segment::Labeled { label: "Código", column: "codigo" },
                Segment::Labeled { label: "Código SKU", column: "sku" },
                Segment::Labeled { label: "Código EAN", column: "ean" },
            ],
            description: &[Segment::Remainder {
                exclude: &["producto", "marca", "codigo", "sku", "ean"],
            }],
        },
    },
];

/// Brand display names in catalog order, as quoted by the brand tools.
pub fn brand_names() -> Vec<&'static str> {
    BRANDS.iter().map(|b| b.name).collect()
}

/// Looks a brand schema up by its lowercase slug.
pub fn find_brand(slug: &str) -> Option<&'static BrandSchema> {
    BRANDS.iter().find(|b| b.slug.eq_ignore_ascii_case(slug))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nine_brands() {
        assert_eq!(BRANDS.len(), 9);
    }

    #[test]
    fn test_multi_sheet_brands() {
        assert_eq!(find_brand("loreal").unwrap().sheets.len(), 5);
        assert_eq!(find_brand("revlon").unwrap().sheets.len(), 5);
        assert_eq!(find_brand("cepage").unwrap().sheets.len(), 1);
    }

    #[test]
    fn test_recipe_columns_exist_in_sheets() {
        // Every column a recipe references must exist in at least one sheet
        // of its brand; otherwise the schema entry is typo'd.
        for brand in BRANDS {
            let known: Vec<&str> = brand
                .sheets
                .iter()
                .flat_map(|s| s.columns.iter().copied())
                .collect();
            let mut referenced: Vec<&str> = Vec::new();
            for segment in brand
                .recipe
                .product
                .iter()
                .chain(brand.recipe.code)
                .chain(brand.recipe.description)
            {
                match segment {
                    Segment::Labeled { column, .. }
                    | Segment::LabeledColon { column, .. }
                    | Segment::Bare { column }
                    | Segment::Weight { column, .. } => referenced.push(column),
                    Segment::Keywords { columns }
                    | Segment::JoinLabeled { columns, .. }
                    | Segment::PresentationJoin { columns }
                    | Segment::Dimensions { columns, .. } => referenced.extend(*columns),
                    Segment::Presentation { size, units } => {
                        referenced.push(size);
                        referenced.push(units);
                    }
                    Segment::BrandTag { .. } | Segment::Remainder { .. } => {}
                }
            }
            for column in referenced {
                assert!(
                    known.contains(&column),
                    "brand {} references unknown column {:?}",
                    brand.name,
                    column
                );
            }
        }
    }

    #[test]
    fn test_find_brand_case_insensitive() {
        assert!(find_brand("Cepage").is_some());
        assert!(find_brand("CEPAGE").is_some());
        assert!(find_brand("nivea").is_none());
    }
}
