use once_cell::sync::Lazy;
use texttransform::report::ReportStyle;

pub static REPORT_STYLE: Lazy<ReportStyle> = Lazy::new(ReportStyle::colored);
