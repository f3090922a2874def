//! Style extraction from a located renderer element

use super::color::{recognize_color, NamedColors};
use super::dialect::Dialect;
use super::tiers::{ColorScope, CATEGORY_TIERS, RANGE_TIERS};
use super::xml_tree::XmlNode;
use crate::classifier::ClassificationMethod;
use crate::features::AttributeValue;
use crate::symbology::{
    CategorizedStyle, CategoryStyle, GraduatedStyle, RangeStyle, SingleStyle, FALLBACK_CLASS_COLOR,
};
use tracing::{debug, warn};

/// Categorized style: one entry per category element
pub fn categorized(renderer: &XmlNode, dialect: Dialect) -> CategorizedStyle {
    let categories = renderer
        .find_all(|n| dialect.is_category(n))
        .into_iter()
        .map(|entry| {
            let value = category_value(entry, dialect);
            let label = category_label(entry, dialect).unwrap_or_else(|| value.clone());
            let color = ColorScope::new(entry, renderer)
                .resolve(CATEGORY_TIERS)
                .unwrap_or_else(|| {
                    debug!(value = %value, "No color found for category, using fallback");
                    FALLBACK_CLASS_COLOR.to_string()
                });

            CategoryStyle {
                value: AttributeValue::Text(value),
                label,
                color,
            }
        })
        .collect();

    CategorizedStyle {
        field: field_name(renderer, dialect),
        categories,
    }
}

/// Graduated style: one range per break element
pub fn graduated(renderer: &XmlNode, dialect: Dialect) -> GraduatedStyle {
    // ArcGIS breaks only carry upper bounds
    let mut previous_upper = match dialect {
        Dialect::ArcGis => renderer
            .find_first(|n| n.name == "MinimumBreak")
            .and_then(XmlNode::text)
            .map(|t| parse_bound(t, "MinimumBreak"))
            .unwrap_or(0.0),
        Dialect::Qgis => 0.0,
    };

    let ranges = renderer
        .find_all(|n| dialect.is_range(n))
        .into_iter()
        .map(|entry| {
            let lower = bound(entry, "lower", "LowerBound").unwrap_or(previous_upper);
            let upper = bound(entry, "upper", "UpperBound").unwrap_or(0.0);
            previous_upper = upper;

            let label = entry
                .attr("label")
                .or_else(|| entry.child_text("Label"))
                .filter(|l| !l.trim().is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("{} - {}", lower, upper));
            let color = ColorScope::new(entry, renderer)
                .resolve(RANGE_TIERS)
                .unwrap_or_else(|| {
                    debug!(lower, upper, "No color found for range, using fallback");
                    FALLBACK_CLASS_COLOR.to_string()
                });

            RangeStyle {
                lower,
                upper,
                label,
                color,
            }
        })
        .collect();

    GraduatedStyle {
        field: field_name(renderer, dialect),
        ranges,
        method: classification_method(renderer),
    }
}

/// Single-symbol style: fill, stroke and stroke width
pub fn single(renderer: &XmlNode, dialect: Dialect) -> SingleStyle {
    let mut style = SingleStyle::default();

    match dialect {
        Dialect::Qgis => {
            // later keys win
            for (key, value) in renderer.subtree_properties(&|_| true) {
                match key.as_str() {
                    "color" | "fill_color" => {
                        if let Some(color) = recognize_color(&value, NamedColors::Broad) {
                            style.fill_color = color;
                        }
                    }
                    "outline_color" | "stroke_color" => {
                        if let Some(color) = recognize_color(&value, NamedColors::Broad) {
                            style.stroke_color = color;
                        }
                    }
                    "outline_width" | "stroke_width" => match value.trim().parse::<f64>() {
                        Ok(width) => style.stroke_width = width,
                        Err(_) => warn!(key = %key, value = %value, "Ignoring unparsable stroke width"),
                    },
                    _ => {}
                }
            }
        }
        Dialect::ArcGis => {
            let first_color = |node: &XmlNode| {
                node.subtree_properties(&|_| true)
                    .iter()
                    .find_map(|(_, v)| recognize_color(v, NamedColors::Broad))
            };

            if let Some(color) = renderer
                .find_first(|n| n.name.contains("Fill"))
                .and_then(first_color)
            {
                style.fill_color = color;
            }
            if let Some(stroke) = renderer.find_first(|n| n.name.contains("Stroke")) {
                if let Some(color) = first_color(stroke) {
                    style.stroke_color = color;
                }
                if let Some(width) = stroke
                    .find_first(|n| n.name == "Width")
                    .and_then(XmlNode::text)
                    .and_then(|w| w.parse::<f64>().ok())
                {
                    style.stroke_width = width;
                }
            }
        }
    }

    style
}

/// Target field: QGIS `attr` attribute, ArcGIS `Field` or first of `Fields`
fn field_name(renderer: &XmlNode, dialect: Dialect) -> Option<String> {
    let field = match dialect {
        Dialect::Qgis => renderer.attr("attr"),
        Dialect::ArcGis => renderer
            .find_first(|n| n.name == "Field")
            .and_then(XmlNode::text)
            .or_else(|| {
                renderer
                    .find_first(|n| n.name == "Fields")?
                    .find_descendant(|n| n.children.is_empty() && n.text().is_some())
                    .and_then(XmlNode::text)
            }),
    };
    field
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
}

fn category_value(entry: &XmlNode, dialect: Dialect) -> String {
    let value = match dialect {
        Dialect::Qgis => entry.attr("value"),
        // RGB colors also carry a <Values> child, so only a direct one counts
        Dialect::ArcGis => entry
            .find_first(|n| n.name == "FieldValues")
            .or_else(|| entry.child("Values"))
            .and_then(|values| {
                values.find_descendant(|n| n.children.is_empty() && n.text().is_some())
            })
            .and_then(XmlNode::text)
            .or_else(|| entry.attr("value")),
    };
    value.unwrap_or_default().to_string()
}

fn category_label(entry: &XmlNode, dialect: Dialect) -> Option<String> {
    let label = match dialect {
        Dialect::Qgis => entry.attr("label"),
        Dialect::ArcGis => entry.child_text("Label").or_else(|| entry.attr("label")),
    };
    label
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string)
}

/// Bound from an attribute or a child element; unparsable text is 0
fn bound(entry: &XmlNode, attribute: &str, element: &str) -> Option<f64> {
    entry
        .attr(attribute)
        .or_else(|| entry.child_text(element))
        .map(|raw| parse_bound(raw, attribute))
}

fn parse_bound(raw: &str, what: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or_else(|_| {
        warn!(bound = what, value = raw, "Unparsable range bound, using 0");
        0.0
    })
}

/// Method from `<method>`, `<mode name>`, `<classificationMethod id>` or
/// `<ClassificationMethod>`; anything unknown is equal interval
fn classification_method(renderer: &XmlNode) -> ClassificationMethod {
    let name = renderer
        .find_first(|n| n.name == "method")
        .and_then(XmlNode::text)
        .or_else(|| renderer.find_first(|n| n.name == "mode")?.attr("name"))
        .or_else(|| renderer.find_first(|n| n.name == "classificationMethod")?.attr("id"))
        .or_else(|| {
            renderer
                .find_first(|n| n.name == "ClassificationMethod")
                .and_then(XmlNode::text)
        });
    ClassificationMethod::parse_or_default(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer(doc: &str, dialect: Dialect) -> XmlNode {
        let root = XmlNode::parse(doc).unwrap();
        dialect.locate_renderer(&root).unwrap().clone()
    }

    #[test]
    fn test_qgis_graduated_bounds_and_labels() {
        let r = renderer(
            r#"<qgis><renderer-v2 attr="pop" type="graduatedSymbol">
                 <ranges>
                   <range lower="0" upper="10.5" label="" symbol="0"/>
                   <range lower="oops" upper="20" label="High" symbol="1"/>
                 </ranges>
                 <mode name="quantile"/>
               </renderer-v2></qgis>"#,
            Dialect::Qgis,
        );
        let style = graduated(&r, Dialect::Qgis);
        assert_eq!(style.field.as_deref(), Some("pop"));
        assert_eq!(style.method, ClassificationMethod::Quantiles);
        assert_eq!(style.ranges[0].label, "0 - 10.5");
        assert_eq!(style.ranges[1].lower, 0.0);
        assert_eq!(style.ranges[1].upper, 20.0);
        assert_eq!(style.ranges[1].label, "High");
        assert_eq!(style.ranges[1].color, FALLBACK_CLASS_COLOR);
    }

    #[test]
    fn test_arcgis_breaks_chain_lower_bounds() {
        let r = renderer(
            r#"<CIMClassBreaksRenderer>
                 <Field>income</Field>
                 <ClassificationMethod>NaturalBreaks</ClassificationMethod>
                 <MinimumBreak>5</MinimumBreak>
                 <Breaks>
                   <CIMClassBreak><Label>Low</Label><UpperBound>10</UpperBound></CIMClassBreak>
                   <CIMClassBreak><UpperBound>30</UpperBound></CIMClassBreak>
                 </Breaks>
               </CIMClassBreaksRenderer>"#,
            Dialect::ArcGis,
        );
        let style = graduated(&r, Dialect::ArcGis);
        assert_eq!(style.field.as_deref(), Some("income"));
        assert_eq!(style.method, ClassificationMethod::Jenks);
        assert_eq!((style.ranges[0].lower, style.ranges[0].upper), (5.0, 10.0));
        assert_eq!((style.ranges[1].lower, style.ranges[1].upper), (10.0, 30.0));
        assert_eq!(style.ranges[1].label, "10 - 30");
    }

    #[test]
    fn test_qgis_single_later_keys_win() {
        let r = renderer(
            r##"<qgis><renderer-v2 type="singleSymbol"><symbols><symbol name="0">
                 <layer>
                   <prop k="color" v="255,0,0,255"/>
                   <prop k="outline_color" v="0,0,0,255"/>
                   <prop k="outline_width" v="0.5"/>
                   <prop k="fill_color" v="#00ff00"/>
                 </layer>
               </symbol></symbols></renderer-v2></qgis>"##,
            Dialect::Qgis,
        );
        let style = single(&r, Dialect::Qgis);
        assert_eq!(style.fill_color, "#00ff00");
        assert_eq!(style.stroke_color, "#000000");
        assert_eq!(style.stroke_width, 0.5);
    }

    #[test]
    fn test_arcgis_single_fill_and_stroke() {
        let r = renderer(
            r#"<CIMSimpleRenderer><Symbol><CIMSymbolReference><Symbol><CIMPolygonSymbol><SymbolLayers>
                 <CIMSolidStroke><Width>2.5</Width><Color><CIMRGBColor><R>1</R><G>2</G><B>3</B></CIMRGBColor></Color></CIMSolidStroke>
                 <CIMSolidFill><Color><CIMRGBColor><R>250</R><G>0</G><B>0</B></CIMRGBColor></Color></CIMSolidFill>
               </SymbolLayers></CIMPolygonSymbol></Symbol></CIMSymbolReference></Symbol></CIMSimpleRenderer>"#,
            Dialect::ArcGis,
        );
        let style = single(&r, Dialect::ArcGis);
        assert_eq!(style.fill_color, "#fa0000");
        assert_eq!(style.stroke_color, "#010203");
        assert_eq!(style.stroke_width, 2.5);
    }

    #[test]
    fn test_single_defaults_when_nothing_found() {
        let r = renderer(r#"<qgis><renderer-v2 type="singleSymbol"/></qgis>"#, Dialect::Qgis);
        assert_eq!(single(&r, Dialect::Qgis), SingleStyle::default());
    }

    #[test]
    fn test_arcgis_category_values_and_fields() {
        let r = renderer(
            r#"<CIMUniqueValueRenderer>
                 <Fields><String>landuse</String></Fields>
                 <Groups><CIMUniqueValueGroup><Classes>
                   <CIMUniqueValueClass>
                     <Label>Forest</Label>
                     <Values><CIMUniqueValue><FieldValues><String>F</String></FieldValues></CIMUniqueValue></Values>
                   </CIMUniqueValueClass>
                 </Classes></CIMUniqueValueGroup></Groups>
               </CIMUniqueValueRenderer>"#,
            Dialect::ArcGis,
        );
        let style = categorized(&r, Dialect::ArcGis);
        assert_eq!(style.field.as_deref(), Some("landuse"));
        assert_eq!(style.categories.len(), 1);
        assert_eq!(style.categories[0].value, AttributeValue::from("F"));
        assert_eq!(style.categories[0].label, "Forest");
        assert_eq!(style.categories[0].color, FALLBACK_CLASS_COLOR);
    }
}
