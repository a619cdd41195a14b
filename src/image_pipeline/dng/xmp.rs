//! Minimal XMP packet mirroring the TIFF/EXIF identity and capture fields.

use std::fmt::Write;

use crate::image_pipeline::dng::negative::DngNegative;
use crate::image_pipeline::dng::types::URational;

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

fn rational(value: URational) -> String {
    format!("{}/{}", value.n, value.d)
}

pub fn build_packet(negative: &DngNegative) -> String {
    let exif = negative.exif();
    let mut attrs = String::new();
    let mut attr = |name: &str, value: String| {
        let _ = write!(attrs, "\n   {}=\"{}\"", name, escape(&value));
    };

    if !exif.make.is_empty() {
        attr("tiff:Make", exif.make.clone());
    }
    if !exif.model.is_empty() {
        attr("tiff:Model", exif.model.clone());
    }
    attr("tiff:Orientation", negative.base_orientation.tiff_value().to_string());
    if let Some(software) = &negative.software {
        attr("xmp:CreatorTool", software.clone());
    }
    if let Some(t) = exif.exposure_time {
        attr("exif:ExposureTime", rational(t));
    }
    if let Some(f) = exif.f_number {
        attr("exif:FNumber", rational(f));
    }
    if let Some(fl) = exif.focal_length {
        attr("exif:FocalLength", rational(fl));
    }
    if exif.iso_speed_ratings[0] != 0 {
        attr("exif:ISOSpeedRatings", exif.iso_speed_ratings[0].to_string());
    }
    if let Some(profile) = negative.profiles().first().and_then(|p| p.name()) {
        attr("crs:CameraProfile", profile.to_string());
    }

    format!(
        "<?xpacket begin=\"\u{feff}\" id=\"W5M0MpCehiHzreSzNTczkc9d\"?>\n\
         <x:xmpmeta xmlns:x=\"adobe:ns:meta/\">\n\
         <rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\">\n\
         <rdf:Description rdf:about=\"\"\n   \
         xmlns:tiff=\"http://ns.adobe.com/tiff/1.0/\"\n   \
         xmlns:exif=\"http://ns.adobe.com/exif/1.0/\"\n   \
         xmlns:xmp=\"http://ns.adobe.com/xap/1.0/\"\n   \
         xmlns:crs=\"http://ns.adobe.com/camera-raw-settings/1.0/\"{}/>\n\
         </rdf:RDF>\n\
         </x:xmpmeta>\n\
         <?xpacket end=\"w\"?>",
        attrs
    )
}
