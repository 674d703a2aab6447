//! PDF 生成服务 - 业务能力层
//!
//! 每张图片一页，页面尺寸等于图片像素尺寸（1 像素 = 1 pt）。
//! JPEG 原样嵌入（DCTDecode），其他格式解码成 8 位 RGB 后 Flate 压缩，透明通道丢弃。

use crate::error::AssemblyError;
use image::{ColorType, DynamicImage, ImageFormat};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::path::{Path, PathBuf};
use tracing::debug;

/// 文档合成能力
pub trait DocumentAssembler: Send + Sync {
    /// 按顺序把图片合成为一个文档，返回文档字节
    fn assemble(&self, image_paths: &[PathBuf]) -> Result<Vec<u8>, AssemblyError>;
}

/// 基于 lopdf 的 PDF 生成器
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfAssembler;

impl DocumentAssembler for PdfAssembler {
    fn assemble(&self, image_paths: &[PathBuf]) -> Result<Vec<u8>, AssemblyError> {
        if image_paths.is_empty() {
            return Err(AssemblyError::Empty);
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids: Vec<Object> = Vec::with_capacity(image_paths.len());
        for path in image_paths {
            let image = load_page_image(path)?;
            debug!(
                "写入 PDF 页面: {} ({}x{})",
                path.display(),
                image.width,
                image.height
            );
            kids.push(add_page(&mut doc, pages_id, image)?.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| AssemblyError::Pdf(e.into()))?;
        Ok(buffer)
    }
}

/// 准备写入 PDF 的图片数据
struct PageImageStream {
    width: u32,
    height: u32,
    stream: Stream,
}

fn load_page_image(path: &Path) -> Result<PageImageStream, AssemblyError> {
    let bytes = std::fs::read(path).map_err(|source| AssemblyError::ReadImage {
        path: path.to_path_buf(),
        source,
    })?;
    let decode_err = |source| AssemblyError::DecodeImage {
        path: path.to_path_buf(),
        source,
    };

    let format = image::guess_format(&bytes).map_err(decode_err)?;
    let decoded = image::load_from_memory_with_format(&bytes, format).map_err(decode_err)?;
    let (width, height) = (decoded.width(), decoded.height());

    let stream = match (format, decoded.color()) {
        (ImageFormat::Jpeg, ColorType::Rgb8) => jpeg_stream(width, height, "DeviceRGB", bytes),
        (ImageFormat::Jpeg, ColorType::L8) => jpeg_stream(width, height, "DeviceGray", bytes),
        _ => raw_rgb_stream(decoded)?,
    };

    Ok(PageImageStream {
        width,
        height,
        stream,
    })
}

fn jpeg_stream(width: u32, height: u32, color_space: &str, bytes: Vec<u8>) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        bytes,
    )
}

fn raw_rgb_stream(decoded: DynamicImage) -> Result<Stream, AssemblyError> {
    let rgb = decoded.to_rgb8();
    let mut stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => rgb.width() as i64,
            "Height" => rgb.height() as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        rgb.into_raw(),
    );
    stream
        .compress()
        .map_err(|e| AssemblyError::Pdf(e.into()))?;
    Ok(stream)
}

fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    image: PageImageStream,
) -> Result<ObjectId, AssemblyError> {
    let (width, height) = (image.width as i64, image.height as i64);
    let image_id = doc.add_object(image.stream);

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![width.into(), 0.into(), 0.into(), height.into(), 0.into(), 0.into()],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                "Im0" => image_id,
            },
        },
    }))
}

/// 生成 PDF 并写入文件
pub async fn write_document(
    assembler: &dyn DocumentAssembler,
    image_paths: &[PathBuf],
    output: &Path,
) -> Result<(), AssemblyError> {
    let bytes = assembler.assemble(image_paths)?;
    tokio::fs::write(output, bytes)
        .await
        .map_err(|source| AssemblyError::Write {
            path: output.to_path_buf(),
            source,
        })
}
