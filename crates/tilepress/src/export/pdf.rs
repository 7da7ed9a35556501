//! Paginated-document encoder
//!
//! Builds the output PDF directly with lopdf: one page per tile with
//! the tile surface embedded full-bleed as an image XObject, plus a
//! final assembly-guide page set in Helvetica.

use crate::compose::{Tile, TileSet};
use crate::constants::{
    cm_to_pt, GUIDE_FONT_SIZE, GUIDE_LINE_HEIGHT, GUIDE_MARGIN_CM, HELVETICA_CHAR_WIDTH_RATIO,
};
use crate::layout::ResolvedLayout;
use crate::options::TileOptions;
use crate::types::*;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::RgbaImage;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;

use super::guide::assembly_guide;

/// Encode the tile set as a multi-page PDF
pub fn encode_pdf(
    tile_set: &TileSet,
    layout: &ResolvedLayout,
    options: &TileOptions,
) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let page_w_pt = cm_to_pt(layout.page_width_cm);
    let page_h_pt = cm_to_pt(layout.page_height_cm);

    let mut kids = Vec::new();
    for tile in &tile_set.tiles {
        let page_id = render_tile_page(&mut doc, tile, page_w_pt, page_h_pt, pages_id)?;
        kids.push(Object::Reference(page_id));
    }

    let guide_text = assembly_guide(tile_set, options);
    let guide_id = render_guide_page(&mut doc, &guide_text, page_w_pt, page_h_pt, pages_id);
    kids.push(Object::Reference(guide_id));

    let count = kids.len() as i64;
    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(count)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

/// One output page: the tile surface scaled to cover the full page
fn render_tile_page(
    doc: &mut Document,
    tile: &Tile,
    page_w_pt: f32,
    page_h_pt: f32,
    parent_pages_id: ObjectId,
) -> Result<ObjectId> {
    let image_id = create_image_xobject(doc, &tile.surface)?;

    // Image XObjects span the unit square; scale to the page box.
    let content = format!("q {} 0 0 {} 0 0 cm /T0 Do Q\n", page_w_pt, page_h_pt);
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

    let mut xobjects = Dictionary::new();
    xobjects.set("T0", Object::Reference(image_id));
    let mut resources = Dictionary::new();
    resources.set("XObject", Object::Dictionary(xobjects));

    let page_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(parent_pages_id)),
        (
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(page_w_pt),
                Object::Real(page_h_pt),
            ]),
        ),
        ("Resources", Object::Dictionary(resources)),
        ("Contents", Object::Reference(content_id)),
    ]);
    Ok(doc.add_object(page_dict))
}

/// Flate-compressed DeviceRGB image XObject from a tile surface
fn create_image_xobject(doc: &mut Document, surface: &RgbaImage) -> Result<ObjectId> {
    let mut rgb = Vec::with_capacity((surface.width() * surface.height() * 3) as usize);
    for pixel in surface.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&rgb)?;
    let compressed = encoder.finish()?;

    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(surface.width() as i64));
    dict.set("Height", Object::Integer(surface.height() as i64));
    dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
    dict.set("BitsPerComponent", Object::Integer(8));
    dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));

    let mut stream = Stream::new(dict, compressed);
    stream.allows_compression = false;
    Ok(doc.add_object(stream))
}

/// Final page: the assembly guide, word-wrapped to the page width
fn render_guide_page(
    doc: &mut Document,
    guide_text: &str,
    page_w_pt: f32,
    page_h_pt: f32,
    parent_pages_id: ObjectId,
) -> ObjectId {
    let mut font_dict = Dictionary::new();
    font_dict.set("Type", Object::Name(b"Font".to_vec()));
    font_dict.set("Subtype", Object::Name(b"Type1".to_vec()));
    font_dict.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
    let font_id = doc.add_object(font_dict);

    let margin_pt = cm_to_pt(GUIDE_MARGIN_CM);
    let usable_width = page_w_pt - 2.0 * margin_pt;
    let lines = wrap_text(guide_text, usable_width);

    let mut ops = String::new();
    for (i, line) in lines.iter().enumerate() {
        let y = page_h_pt - margin_pt - GUIDE_LINE_HEIGHT * (i + 1) as f32;
        if y < margin_pt {
            break;
        }
        ops.push_str(&format!(
            "BT /F1 {} Tf {} {} Td ({}) Tj ET\n",
            GUIDE_FONT_SIZE,
            margin_pt,
            y,
            escape_pdf_text(line)
        ));
    }

    let content_id = doc.add_object(Stream::new(Dictionary::new(), ops.into_bytes()));

    let mut fonts = Dictionary::new();
    fonts.set("F1", Object::Reference(font_id));
    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(fonts));

    let page_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(parent_pages_id)),
        (
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(page_w_pt),
                Object::Real(page_h_pt),
            ]),
        ),
        ("Resources", Object::Dictionary(resources)),
        ("Contents", Object::Reference(content_id)),
    ]);
    doc.add_object(page_dict)
}

/// Greedy word wrap using the Helvetica width estimate
fn wrap_text(text: &str, max_width_pt: f32) -> Vec<String> {
    let max_chars =
        ((max_width_pt / (GUIDE_FONT_SIZE * HELVETICA_CHAR_WIDTH_RATIO)) as usize).max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        if paragraph.len() <= max_chars {
            lines.push(paragraph.to_string());
            continue;
        }
        let mut current = String::new();
        for word in paragraph.split(' ') {
            if current.is_empty() {
                current = word.to_string();
            } else if current.len() + 1 + word.len() <= max_chars {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current));
                current = word.to_string();
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

fn escape_pdf_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}
