pub mod hash;
pub mod html;
pub mod json_list;
pub mod jwt;
pub mod validated;
