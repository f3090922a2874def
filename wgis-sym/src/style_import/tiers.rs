//! Tiered color lookup for category and range entries
//!
//! Each tier is a plain function over a [`ColorScope`]; a chain is an
//! ordered slice of tiers and the first hit wins.

use super::color::{recognize_color, NamedColors};
use super::xml_tree::XmlNode;

/// One lookup strategy
pub type ColorTier = fn(&ColorScope<'_>) -> Option<String>;

/// Chain for categorized entries
pub const CATEGORY_TIERS: &[ColorTier] = &[
    entry_properties,
    nested_symbol,
    symbol_layers,
    referenced_symbol,
    any_color_value,
];

/// Chain for graduated entries: no unscoped scan
pub const RANGE_TIERS: &[ColorTier] = &[
    entry_properties,
    nested_symbol,
    symbol_layers,
    referenced_symbol,
];

/// What a tier may look at
#[derive(Debug, Clone, Copy)]
pub struct ColorScope<'a> {
    /// The category or range element
    pub entry: &'a XmlNode,
    /// The renderer that owns the entry (holds the symbol table)
    pub renderer: &'a XmlNode,
}

impl<'a> ColorScope<'a> {
    pub fn new(entry: &'a XmlNode, renderer: &'a XmlNode) -> Self {
        Self { entry, renderer }
    }

    /// First hit of `tiers`, in order
    pub fn resolve(&self, tiers: &[ColorTier]) -> Option<String> {
        tiers.iter().find_map(|tier| tier(self))
    }
}

/// (a) Direct properties of the entry
pub fn entry_properties(scope: &ColorScope<'_>) -> Option<String> {
    keyed_color(&scope.entry.properties())
}

/// (b) Direct properties of the entry's nested symbol
pub fn nested_symbol(scope: &ColorScope<'_>) -> Option<String> {
    symbol_of(scope.entry).and_then(|symbol| keyed_color(&symbol.properties()))
}

/// (c) Anywhere inside the nested symbol's layer sub-nodes
pub fn symbol_layers(scope: &ColorScope<'_>) -> Option<String> {
    symbol_of(scope.entry).and_then(layers_color)
}

/// (c′) The renderer's symbol table entry named by the entry's `symbol`
/// attribute
pub fn referenced_symbol(scope: &ColorScope<'_>) -> Option<String> {
    let reference = scope.entry.attr("symbol")?;
    let symbol = scope
        .renderer
        .find_first(|n| n.name == "symbols")?
        .find_descendant(|n| n.name == "symbol" && n.attr("name") == Some(reference))?;

    keyed_color(&symbol.properties()).or_else(|| layers_color(symbol))
}

/// (d) Any color-looking property value under the entry
pub fn any_color_value(scope: &ColorScope<'_>) -> Option<String> {
    scope
        .entry
        .subtree_properties(&|_| true)
        .iter()
        .find_map(|(_, value)| recognize_color(value, NamedColors::Broad))
}

fn symbol_of(entry: &XmlNode) -> Option<&XmlNode> {
    entry.find_descendant(|n| n.name.to_ascii_lowercase().contains("symbol"))
}

fn layers_color(symbol: &XmlNode) -> Option<String> {
    symbol
        .find_all(|n| n.name.to_ascii_lowercase().contains("layer"))
        .into_iter()
        .find_map(|layer| keyed_color(&layer.subtree_properties(&not_stroke)))
}

/// Stroke sub-trees describe outlines, not fills
fn not_stroke(node: &XmlNode) -> bool {
    !node.name.to_ascii_lowercase().contains("stroke")
}

fn is_color_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.contains("color") || key.contains("fill")
}

fn keyed_color(props: &[(String, String)]) -> Option<String> {
    props
        .iter()
        .filter(|(key, _)| is_color_key(key))
        .find_map(|(_, value)| recognize_color(value, NamedColors::Basic))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope_for<'a>(root: &'a XmlNode, entry_name: &str) -> ColorScope<'a> {
        let entry = root.find_first(|n| n.name == entry_name).unwrap();
        ColorScope::new(entry, root)
    }

    #[test]
    fn test_entry_properties() {
        let root = XmlNode::parse(
            r##"<r><category><prop k="label" v="red"/><prop k="fill" v="#123456"/></category></r>"##,
        )
        .unwrap();
        let scope = scope_for(&root, "category");
        assert_eq!(entry_properties(&scope), Some("#123456".into()));
    }

    #[test]
    fn test_nested_symbol_direct_props() {
        let root = XmlNode::parse(
            r#"<r><category><symbol><prop k="color" v="0,0,255,255"/></symbol></category></r>"#,
        )
        .unwrap();
        let scope = scope_for(&root, "category");
        assert_eq!(entry_properties(&scope), None);
        assert_eq!(nested_symbol(&scope), Some("#0000ff".into()));
    }

    #[test]
    fn test_symbol_layer_three_levels_deep() {
        let root = XmlNode::parse(
            r#"<r><category value="a">
                 <symbol>
                   <layer class="SimpleFill">
                     <Option type="Map">
                       <Option name="data_defined_properties" type="Map">
                         <Option name="style" type="Map">
                           <Option name="color" value="10,20,30,255" type="QString"/>
                         </Option>
                       </Option>
                     </Option>
                   </layer>
                 </symbol>
               </category></r>"#,
        )
        .unwrap();
        let scope = scope_for(&root, "category");
        assert_eq!(nested_symbol(&scope), None);
        assert_eq!(symbol_layers(&scope), Some("#0a141e".into()));
    }

    #[test]
    fn test_referenced_symbol() {
        let root = XmlNode::parse(
            r#"<renderer-v2>
                 <categories><category value="a" symbol="1"/></categories>
                 <symbols>
                   <symbol name="0"><layer><prop k="color" v="1,1,1,255"/></layer></symbol>
                   <symbol name="1"><layer><prop k="color" v="2,2,2,255"/></layer></symbol>
                 </symbols>
                 <source-symbol><symbol name="1"><layer><prop k="color" v="9,9,9,255"/></layer></symbol></source-symbol>
               </renderer-v2>"#,
        )
        .unwrap();
        let scope = scope_for(&root, "category");
        assert_eq!(scope.resolve(&CATEGORY_TIERS[..3]), None);
        assert_eq!(referenced_symbol(&scope), Some("#020202".into()));
    }

    #[test]
    fn test_unscoped_scan_uses_broad_names() {
        let root = XmlNode::parse(
            r#"<r><category><Meta><Hint>orange</Hint></Meta></category></r>"#,
        )
        .unwrap();
        let scope = scope_for(&root, "category");
        assert_eq!(scope.resolve(RANGE_TIERS), None);
        assert_eq!(scope.resolve(CATEGORY_TIERS), Some("orange".into()));
    }

    #[test]
    fn test_arcgis_fill_preferred_over_stroke() {
        let root = XmlNode::parse(
            r#"<CIMUniqueValueClass>
                 <Symbol><CIMSymbolReference><Symbol><CIMPolygonSymbol><SymbolLayers>
                   <CIMSolidStroke><Color><CIMRGBColor><R>0</R><G>0</G><B>0</B></CIMRGBColor></Color></CIMSolidStroke>
                   <CIMSolidFill><Color><CIMRGBColor><R>255</R><G>0</G><B>0</B></CIMRGBColor></Color></CIMSolidFill>
                 </SymbolLayers></CIMPolygonSymbol></Symbol></CIMSymbolReference></Symbol>
               </CIMUniqueValueClass>"#,
        )
        .unwrap();
        let scope = ColorScope::new(&root, &root);
        assert_eq!(scope.resolve(CATEGORY_TIERS), Some("#ff0000".into()));
    }

    #[test]
    fn test_no_color_anywhere() {
        let root = XmlNode::parse(r#"<r><category value="x" label="y"/></r>"#).unwrap();
        let scope = scope_for(&root, "category");
        assert_eq!(scope.resolve(CATEGORY_TIERS), None);
    }
}
