//! # dxf-lite
//!
//! Écriture et lecture d'un sous-ensemble du format DXF (Drawing Exchange Format)
//! suffisant pour échanger des polylignes ouvertes avec un logiciel de CAO.
//!
//! ## Features
//!
//! - Document minimal: en-tête (`$INSUNITS`, `$EXTMIN`, `$EXTMAX`), entités, `EOF`
//! - Entités LWPOLYLINE avec calque, couleur ACI et drapeau de fermeture
//! - Sortie déterministe en précision complète
//! - Lecture tolérante (CRLF, sections et entités inconnues ignorées),
//!   décodage selon `$DWGCODEPAGE` avec `simdutf8` et `encoding_rs`
//!
//! ## Usage
//!
//! ```rust
//! use dxf_lite::{AciColor, Document, Header, LwPolyline};
//!
//! let polyline = LwPolyline::open("ROAD_CURB", AciColor::BLUE, vec![(0.0, 0.0), (10.0, 5.0)]);
//! let doc = Document::new(Header::default(), vec![polyline.into()]);
//!
//! let text = dxf_lite::to_string(&doc)?;
//! let back = dxf_lite::parse(text.as_bytes())?;
//! assert_eq!(back.entities.len(), 1);
//! # Ok::<(), dxf_lite::DxfError>(())
//! ```

pub mod error;
pub mod reader;
pub mod types;
pub mod writer;

pub use error::DxfError;
pub use reader::{parse, parse_str};
pub use types::{AciColor, Document, Entity, Extents, Header, LwPolyline, Units};
pub use writer::{is_valid_layer_name, to_string, validate, write_document, ACAD_VERSION};
