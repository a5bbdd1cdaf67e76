//! Built-in templates used when no template file is given.
//!
//! Both are deliberately minimal: they carry exactly the anchors the
//! assembler edits and nothing else.

use crate::config::TemplateFlavor;

/// beamerposter, 120×72 cm, three fixed-width columns.
pub const BEAMER_TEMPLATE: &str = r"\documentclass[final]{beamer}
\usepackage[size=custom,width=120,height=72,scale=1.0]{beamerposter}
\usepackage{graphicx}
\usepackage{amsmath,amssymb}
\usepackage{tikz}

\newlength{\sepwidth}
\newlength{\colwidth}
\setlength{\sepwidth}{0.025\paperwidth}
\setlength{\colwidth}{0.3\paperwidth}
\newcommand{\separatorcolumn}{\begin{column}{\sepwidth}\end{column}}

\setbeamertemplate{navigation symbols}{}
\setbeamertemplate{headline}{
  \leavevmode
  \begin{beamercolorbox}[wd=\paperwidth,ht=8ex,dp=2ex,center]{headline}
    {\usebeamerfont{title}\inserttitle\par}
    \vspace{1ex}
    {\usebeamerfont{author}\insertauthor\par}
    {\usebeamerfont{institute}\insertinstitute\par}
  \end{beamercolorbox}
}

\title{Poster Title}
\author{Authors}
\institute[shortinst]{Institute}

\begin{document}
\begin{frame}[t]
\begin{columns}[t]
\separatorcolumn
\begin{column}{\colwidth}
\end{column}
\separatorcolumn
\end{columns}
\end{frame}
\end{document}
";

/// baposter, A0 portrait, three columns.
pub const BAPOSTER_TEMPLATE: &str = r"\documentclass[a0paper,portrait]{baposter}
\usepackage{graphicx}
\usepackage{amsmath,amssymb}
\usepackage{caption}

\begin{document}
\begin{poster}{
  grid=false,
  columns=3,
  colspacing=1em,
  headerborder=closed,
  borderColor=black,
  headerColorOne=white,
  boxColorOne=white,
  textborder=rectangle,
  eyecatcher=false,
  headerheight=0.1\textheight
}
{}
{Poster Title}
{Authors}
{}

\end{poster}
\end{document}
";

/// Template text for a flavor; `Auto` gets the beamer template.
pub fn builtin_template(flavor: TemplateFlavor) -> &'static str {
    match flavor {
        TemplateFlavor::Baposter => BAPOSTER_TEMPLATE,
        TemplateFlavor::Auto | TemplateFlavor::BeamerFixed | TemplateFlavor::BeamerAdaptive => {
            BEAMER_TEMPLATE
        }
    }
}
