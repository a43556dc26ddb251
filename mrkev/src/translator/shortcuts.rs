//! Desugaring of naming-convention shortcuts into calls of built-in blocks.

use crate::sigil::{CONTENT, ITEM, ITEM_LIST, LINK, LINK_PREFIX, LINK_TARGET, LIST_ITEM};
use crate::tree::{Block, ParseNode};

fn is_list_item(node: &ParseNode) -> bool {
    matches!(node, ParseNode::Block(block) if block.name == LIST_ITEM)
}

/// Regroup `[.]` items of one content sequence.
///
/// Each item becomes an `Item` call whose content is its own `#` value
/// followed by the siblings up to the next item. The run of items is replaced
/// by a single `ItemList` call; anything before the first item stays in
/// front of it.
pub(crate) fn group_list_items(nodes: Vec<ParseNode>) -> Vec<ParseNode> {
    if !nodes.iter().any(is_list_item) {
        return nodes;
    }

    let mut leading = Vec::new();
    let mut items: Vec<Block> = Vec::new();

    for node in nodes {
        match node {
            ParseNode::Block(mut block) if block.name == LIST_ITEM => {
                block.name = ITEM.to_string();
                if block.content().is_none() {
                    block = block.with_param(CONTENT, Vec::new());
                }
                items.push(block);
            }
            other => match items.last_mut().and_then(|item| item.param_mut(CONTENT)) {
                Some(content) => content.content.push(other),
                None => leading.push(other),
            },
        }
    }

    let start = items.first().map(|item| item.span.start).unwrap_or(0);
    let end = items.last().map(|item| item.span.end).unwrap_or(start);
    let mut list = Block::new(ITEM_LIST).with_param(
        CONTENT,
        items.into_iter().map(ParseNode::Block).collect(),
    );
    list.span = start..end;

    leading.push(ParseNode::Block(list));
    leading
}

/// `[>target ...]` becomes `[Link Target=[target] ...]`.
///
/// An explicit `Target` parameter wins over the one in the name.
pub(crate) fn expand_link(mut block: Block) -> Block {
    let Some(target) = block.name.strip_prefix(LINK_PREFIX) else {
        return block;
    };
    let target = target.to_string();

    block.name = LINK.to_string();
    if !target.is_empty() && block.param(LINK_TARGET).is_none() {
        block = block.with_param(LINK_TARGET, vec![ParseNode::literal(target)]);
    }
    block
}
