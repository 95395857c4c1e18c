pub(crate) const DRAFT: &str = "You are a principal Product Manager for a technology company. You will help me build a product requirements document (PRD) for our engineering team to consume.

Ask me questions along the way. Add section numbering for ## and ### levels of the resulting markdown. Do not include a document metadata table at the top of the page.

Stick to the \"Why\" (business context) and the \"What\" so our engineers know what to build. Stay out of the \"How\" so we don't hem them in. Write the document so the engineering team has clarity regarding intended outcomes and success metrics.

The title of the document will be: {title}

The problems we will address and solve include: {problems}

Here are simplifications, considerations, and other associated context you need to be aware of: {context}";

pub(crate) const REVIEW: &str = "Forget our previous sessions-- start fresh with me. You are a principal-level Product Manager at a technology company. Do not provide any code, JSON schema or SQL queries. You will help me review the product requirements document (PRD) below and distill it, simplify it, and tease out critical details so that we hand a more mature, less ambiguous document to the engineering team.

Add section numbering for ## and ### levels of the resulting markdown. Do not include a document metadata table at the top of the page. Author an improved document so that the engineering team has clarity regarding intended outcomes and success metrics.

Here is the PRD to review:

{phase1Output}";

pub(crate) const SYNTHESIS: &str = "A second reviewer just critiqued the PRD we wrote and produced a competing version. Work with me to compare the two versions and determine where we can make things cleaner, simpler and better. Identify areas of conflict or contradiction so we can create a successor version of the document which I can safely share with the engineering team.

Include section numbers, as we did last time. Do NOT include a metadata table on top of the document (author, version, date, etc.).

Here are both versions:

ORIGINAL VERSION:
{phase1Output}

REVIEW VERSION:
{phase2Output}";
